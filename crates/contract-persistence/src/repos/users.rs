use chrono::NaiveDateTime;
use contract_domain::{hash_password, DomainError, Role, Session, User, UserDraft, UserWithRoles};
use diesel::prelude::*;
use diesel::sql_types::{Bool, Integer, Nullable, Text, Timestamp};
use diesel::sqlite::SqliteConnection;
use log::{debug, info, warn};

use super::{split_roles, unique_as_conflict};
use crate::error::PersistenceError;
use crate::rows::{RoleRow, UserRow};
use crate::schema::{roles, user_roles, users};
use crate::sqlite::{last_insert_id, with_retry, ConnectionProvider};

const DUPLICATE_LOGIN: &str = "a user with this login already exists";

#[derive(QueryableByName, Debug)]
struct UserRolesRow {
    #[diesel(sql_type = Integer)]
    id: i32,
    #[diesel(sql_type = Text)]
    username: String,
    #[diesel(sql_type = Text)]
    full_name: String,
    #[diesel(sql_type = Nullable<Text>)]
    department: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    position: Option<String>,
    #[diesel(sql_type = Nullable<Bool>)]
    is_active: Option<bool>,
    #[diesel(sql_type = Nullable<Timestamp>)]
    created_at: Option<NaiveDateTime>,
    #[diesel(sql_type = Nullable<Text>)]
    roles: Option<String>,
}

impl From<UserRolesRow> for UserWithRoles {
    fn from(r: UserRolesRow) -> Self {
        UserWithRoles { roles: split_roles(r.roles.as_deref()),
                        user: User { id: r.id,
                                     username: r.username,
                                     full_name: r.full_name,
                                     department: r.department,
                                     position: r.position,
                                     is_active: r.is_active.unwrap_or(true),
                                     created_at: r.created_at } }
    }
}

const USERS_WITH_ROLES: &str = "SELECT u.id AS id, u.username AS username, u.full_name AS full_name, \
                                       u.department AS department, u.position AS position, \
                                       u.is_active AS is_active, u.created_at AS created_at, \
                                       GROUP_CONCAT(r.name, ', ') AS roles \
                                FROM users u \
                                LEFT JOIN user_roles ur ON u.id = ur.user_id \
                                LEFT JOIN roles r ON ur.role_id = r.id";

fn role_names_of(conn: &mut SqliteConnection, user_id: i32) -> Result<Vec<String>, PersistenceError> {
    Ok(user_roles::table.inner_join(roles::table)
                        .filter(user_roles::user_id.eq(user_id))
                        .order(roles::name.asc())
                        .select(roles::name)
                        .load::<String>(conn)?)
}

/// Sustituye los roles del usuario por los nombrados; los nombres que no
/// existen en `roles` se ignoran.
fn replace_roles(conn: &mut SqliteConnection, user_id: i32, names: &[String]) -> Result<(), PersistenceError> {
    diesel::delete(user_roles::table.filter(user_roles::user_id.eq(user_id))).execute(conn)?;
    for name in names {
        let role_id = roles::table.filter(roles::name.eq(name))
                                  .select(roles::id)
                                  .first::<i32>(conn)
                                  .optional()?;
        match role_id {
            Some(role_id) => {
                diesel::insert_into(user_roles::table).values((user_roles::user_id.eq(user_id), user_roles::role_id.eq(role_id)))
                                                      .execute(conn)?;
            }
            None => warn!("replace_roles: unknown role '{name}' skipped for user {user_id}"),
        }
    }
    Ok(())
}

/// Usuarios, contraseñas y asignación de roles.
#[derive(Clone)]
pub struct UserRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> UserRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Todos los usuarios con sus roles, ordenados por nombre completo.
    pub fn list(&self) -> Result<Vec<UserWithRoles>, PersistenceError> {
        let rows: Vec<UserRolesRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::sql_query(format!("{USERS_WITH_ROLES} GROUP BY u.id ORDER BY u.full_name")).load(&mut conn)
                                                                                              .map_err(PersistenceError::from)
        })?;
        Ok(rows.into_iter().map(UserWithRoles::from).collect())
    }

    pub fn list_active(&self) -> Result<Vec<UserWithRoles>, PersistenceError> {
        let rows: Vec<UserRolesRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::sql_query(format!("{USERS_WITH_ROLES} WHERE u.is_active = 1 GROUP BY u.id ORDER BY u.full_name"))
                .load(&mut conn)
                .map_err(PersistenceError::from)
        })?;
        Ok(rows.into_iter().map(UserWithRoles::from).collect())
    }

    pub fn get(&self, id: i32) -> Result<User, PersistenceError> {
        let row: Option<UserRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            users::table.find(id)
                        .select(UserRow::as_select())
                        .first(&mut conn)
                        .optional()
                        .map_err(PersistenceError::from)
        })?;
        row.map(User::from).ok_or_else(|| DomainError::NotFound(format!("user {id}")).into())
    }

    pub fn roles_of(&self, user_id: i32) -> Result<Vec<String>, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            role_names_of(&mut conn, user_id)
        })
    }

    /// Alta con contraseña hasheada y roles; devuelve el id nuevo.
    pub fn create(&self, draft: &UserDraft, now: NaiveDateTime) -> Result<i32, PersistenceError> {
        draft.validate(true)?;
        let password = hash_password(draft.password.as_deref().unwrap_or_default());
        debug!("user_create:start username={}", draft.username);
        let id = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.immediate_transaction(|tx| {
                    diesel::insert_into(users::table).values((users::username.eq(draft.username.trim()),
                                                              users::full_name.eq(draft.full_name.trim()),
                                                              users::password.eq(&password),
                                                              users::department.eq(&draft.department),
                                                              users::position.eq(&draft.position),
                                                              users::is_active.eq(draft.is_active),
                                                              users::created_at.eq(now)))
                                                     .execute(tx)?;
                    let id = last_insert_id(tx)?;
                    replace_roles(tx, id, &draft.roles)?;
                    Ok(id)
                })
        }).map_err(|e| unique_as_conflict(e, DUPLICATE_LOGIN))?;
        info!("User '{}' created (id {id})", draft.username);
        Ok(id)
    }

    /// Edición; la contraseña sólo cambia si el borrador trae una no vacía.
    pub fn update(&self, id: i32, draft: &UserDraft) -> Result<(), PersistenceError> {
        draft.validate(false)?;
        let password = draft.password
                            .as_deref()
                            .filter(|p| !p.trim().is_empty())
                            .map(hash_password);
        let updated = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.immediate_transaction(|tx| {
                    let n = diesel::update(users::table.find(id)).set((users::username.eq(draft.username.trim()),
                                                                       users::full_name.eq(draft.full_name.trim()),
                                                                       users::department.eq(&draft.department),
                                                                       users::position.eq(&draft.position),
                                                                       users::is_active.eq(draft.is_active)))
                                                                 .execute(tx)?;
                    if n == 0 {
                        return Ok(0);
                    }
                    if let Some(hash) = &password {
                        diesel::update(users::table.find(id)).set(users::password.eq(hash)).execute(tx)?;
                    }
                    replace_roles(tx, id, &draft.roles)?;
                    Ok(n)
                })
        }).map_err(|e| unique_as_conflict(e, DUPLICATE_LOGIN))?;
        if updated == 0 {
            return Err(DomainError::NotFound(format!("user {id}")).into());
        }
        info!("User '{}' updated (id {id})", draft.username);
        Ok(())
    }

    /// Borra primero las asignaciones de rol y luego el usuario.
    pub fn delete(&self, id: i32) -> Result<(), PersistenceError> {
        let deleted = with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.immediate_transaction(|tx| {
                    diesel::delete(user_roles::table.filter(user_roles::user_id.eq(id))).execute(tx)?;
                    Ok::<usize, PersistenceError>(diesel::delete(users::table.find(id)).execute(tx)?)
                })
        })?;
        if deleted == 0 {
            return Err(DomainError::NotFound(format!("user {id}")).into());
        }
        info!("User {id} deleted");
        Ok(())
    }

    /// Comprueba usuario activo y contraseña; `Ok(None)` si no coinciden.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<Session>, PersistenceError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Ok(None);
        }
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            let found = users::table.filter(users::username.eq(username))
                                    .filter(users::is_active.eq(true))
                                    .select((users::id, users::full_name, users::password, users::department))
                                    .first::<(i32, String, String, Option<String>)>(&mut conn)
                                    .optional()?;
            let Some((user_id, full_name, stored, department)) = found else {
                return Ok(None);
            };
            if stored != hash_password(password) {
                return Ok(None);
            }
            let roles = role_names_of(&mut conn, user_id)?;
            Ok(Some(Session { user_id,
                              username: username.to_string(),
                              full_name,
                              roles,
                              department }))
        })
    }
}

/// Catálogo de roles.
#[derive(Clone)]
pub struct RoleRepository<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> RoleRepository<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn list(&self) -> Result<Vec<Role>, PersistenceError> {
        let rows: Vec<RoleRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            roles::table.order(roles::name.asc())
                        .select(RoleRow::as_select())
                        .load(&mut conn)
                        .map_err(PersistenceError::from)
        })?;
        Ok(rows.into_iter().map(Role::from).collect())
    }
}
