use chrono::NaiveDateTime;
use contract_domain::{DomainError, Organization, OrganizationDraft, OrganizationOption};
use diesel::prelude::*;
use log::{debug, info};

use super::unique_as_conflict;
use crate::error::PersistenceError;
use crate::rows::OrganizationRow;
use crate::schema::{contracts, organizations};
use crate::sqlite::{last_insert_id, with_retry, ConnectionProvider};

const DUPLICATE_INN: &str = "an organization with this INN already exists";

/// Contrapartes (`organizations`).
#[derive(Clone)]
pub struct OrganizationRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> OrganizationRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Todas las organizaciones ordenadas por nombre.
    pub fn list(&self) -> Result<Vec<Organization>, PersistenceError> {
        let rows: Vec<OrganizationRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            organizations::table.order(organizations::name.asc())
                                .select(OrganizationRow::as_select())
                                .load(&mut conn)
                                .map_err(PersistenceError::from)
        })?;
        Ok(rows.into_iter().map(Organization::from).collect())
    }

    pub fn get(&self, id: i32) -> Result<Organization, PersistenceError> {
        let row: Option<OrganizationRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            organizations::table.find(id)
                                .select(OrganizationRow::as_select())
                                .first(&mut conn)
                                .optional()
                                .map_err(PersistenceError::from)
        })?;
        row.map(Organization::from)
           .ok_or_else(|| DomainError::NotFound(format!("organization {id}")).into())
    }

    /// Valida y guarda una organización nueva; devuelve su id.
    pub fn create(&self, draft: OrganizationDraft, now: NaiveDateTime) -> Result<i32, PersistenceError> {
        let draft = draft.normalized();
        draft.validate()?;
        debug!("org_create:start name={}", draft.name);
        let id = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.immediate_transaction(|tx| {
                    diesel::insert_into(organizations::table).values((organizations::name.eq(&draft.name),
                                                                      organizations::organization_type.eq(draft.organization_type
                                                                                                              .as_str()),
                                                                      organizations::inn.eq(&draft.inn),
                                                                      organizations::kpp.eq(&draft.kpp),
                                                                      organizations::ogrn.eq(&draft.ogrn),
                                                                      organizations::legal_address.eq(&draft.legal_address),
                                                                      organizations::phone.eq(&draft.phone),
                                                                      organizations::email.eq(&draft.email),
                                                                      organizations::created_at.eq(now)))
                                                             .execute(tx)?;
                    last_insert_id(tx)
                })
        }).map_err(|e| unique_as_conflict(e, DUPLICATE_INN))?;
        info!("Organization '{}' created (id {id})", draft.name);
        Ok(id)
    }

    pub fn update(&self, id: i32, draft: OrganizationDraft) -> Result<(), PersistenceError> {
        let draft = draft.normalized();
        draft.validate()?;
        let updated = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::update(organizations::table.find(id)).set((organizations::name.eq(&draft.name),
                                                               organizations::organization_type.eq(draft.organization_type.as_str()),
                                                               organizations::inn.eq(&draft.inn),
                                                               organizations::kpp.eq(&draft.kpp),
                                                               organizations::ogrn.eq(&draft.ogrn),
                                                               organizations::legal_address.eq(&draft.legal_address),
                                                               organizations::phone.eq(&draft.phone),
                                                               organizations::email.eq(&draft.email)))
                                                         .execute(&mut conn)
                                                         .map_err(PersistenceError::from)
        }).map_err(|e| unique_as_conflict(e, DUPLICATE_INN))?;
        if updated == 0 {
            return Err(DomainError::NotFound(format!("organization {id}")).into());
        }
        info!("Organization '{}' updated (id {id})", draft.name);
        Ok(())
    }

    /// Número de contratos que apuntan a la organización.
    pub fn contract_count(&self, id: i32) -> Result<i64, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            contracts::table.filter(contracts::counterparty.eq(id.to_string()))
                            .count()
                            .get_result::<i64>(&mut conn)
                            .map_err(PersistenceError::from)
        })
    }

    /// Borra la organización salvo que algún contrato la use como contraparte.
    pub fn delete(&self, id: i32) -> Result<(), PersistenceError> {
        let deleted = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.immediate_transaction(|tx| {
                    let used = contracts::table.filter(contracts::counterparty.eq(id.to_string()))
                                               .count()
                                               .get_result::<i64>(tx)?;
                    if used > 0 {
                        return Err(PersistenceError::Domain(DomainError::Conflict(format!("organization is used in {used} contract(s); \
                                                                                          delete or reassign them first"))));
                    }
                    Ok(diesel::delete(organizations::table.find(id)).execute(tx)?)
                })
        })?;
        if deleted == 0 {
            return Err(DomainError::NotFound(format!("organization {id}")).into());
        }
        info!("Organization {id} deleted");
        Ok(())
    }

    /// Entradas (id, nombre, ИНН) para elegir contraparte.
    pub fn options(&self) -> Result<Vec<OrganizationOption>, PersistenceError> {
        let rows: Vec<(i32, String, Option<String>)> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            organizations::table.order(organizations::name.asc())
                                .select((organizations::id, organizations::name, organizations::inn))
                                .load(&mut conn)
                                .map_err(PersistenceError::from)
        })?;
        Ok(rows.into_iter().map(|(id, name, inn)| OrganizationOption { id, name, inn }).collect())
    }
}
