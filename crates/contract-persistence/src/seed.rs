//! Datos iniciales: organización propia, contrapartes de prueba, roles,
//! usuarios, rutas de aprobación y contratos en borrador.
//!
//! Cada tabla se siembra sólo si está vacía, así que ejecutar la siembra sobre
//! una base existente no duplica nada.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use contract_core::FlowStep;
use contract_domain::user::{ROLE_ADMIN, ROLE_COMMERCIAL_DIRECTOR, ROLE_FINANCE_DIRECTOR, ROLE_GENERAL_DIRECTOR, ROLE_LAWYER,
                            ROLE_LOGISTICS, ROLE_PURCHASE_HEAD, ROLE_SALES_HEAD, ROLE_SECURITY};
use contract_domain::{hash_password, ContractStatus};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info, warn};
use serde::Serialize;

use crate::error::PersistenceError;
use crate::schema::{approval_flows, contracts, organizations, roles, user_roles, users};
use crate::sqlite::{last_insert_id, with_retry, ConnectionProvider};

/// Filas insertadas por tabla en una siembra.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub organizations: usize,
    pub roles: usize,
    pub users: usize,
    pub flows: usize,
    pub contracts: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        *self == SeedReport::default()
    }
}

struct SeedOrganization {
    name: &'static str,
    kind: &'static str,
    inn: &'static str,
    kpp: &'static str,
    ogrn: &'static str,
    address: &'static str,
    phone: &'static str,
    email: &'static str,
}

const fn org(name: &'static str,
             kind: &'static str,
             inn: &'static str,
             kpp: &'static str,
             ogrn: &'static str,
             address: &'static str,
             phone: &'static str,
             email: &'static str)
             -> SeedOrganization {
    SeedOrganization { name, kind, inn, kpp, ogrn, address, phone, email }
}

const ORGANIZATIONS: [SeedOrganization; 21] = [
    org("ООО 'ФАСТЛЭНД'", "legal", "7703234453", "770301001", "1027739292448",
        "123242, Г.МОСКВА, ВН.ТЕР.Г. МУНИЦИПАЛЬНЫЙ ОКРУГ ПРЕСНЕНСКИЙ, УЛ БОЛЬШАЯ ГРУЗИНСКАЯ, Д. 20, ПОМЕЩ. 3/П",
        "+7 (495) 785-81-11", "fastland@cafemumu.ru"),
    org("ООО 'Поставщик+'", "legal", "3328450239", "772501001", "1073328002846",
        "115470, Г.МОСКВА, УЛ. СУДОСТРОИТЕЛЬНАЯ, Д.25, К.2", "+7 (495) 123-45-67", "info@postavchik.ru"),
    org("ТК 'Ашан'", "legal", "7703270067", "502901001", "1027739329408",
        "141031, МОСКОВСКАЯ ОБЛАСТЬ, Г.О. МЫТИЩИ, Г МЫТИЩИ, Ш ОСТАШКОВСКОЕ, Д. 1", "+7 (495) 234-56-78",
        "contracts@auchan.ru"),
    org("ООО 'СервисПро'", "legal", "772708432703", "772701001", "1237700891119",
        "117461, Г.МОСКВА, ВН.ТЕР.Г. МУНИЦИПАЛЬНЫЙ ОКРУГ ЗЮЗИНО, УЛ ХЕРСОНСКАЯ, Д. 5, К. 2, ПОМЕЩ. 1Н",
        "+7 (495) 345-67-89", "office@servicepro.ru"),
    org("ИП Иванова И.В.", "individual", "500300703103", "", "323774600494380",
        "125373, г.Москва, Походный проезд, домовладение 3, стр.2", "+7 (495) 456-78-90", "ivanov@mail.ru"),
    org("ООО 'МеталлТрейд'", "legal", "7708123456", "770801001", "1157746123456",
        "109428, г.Москва, Рязанский проспект, д.8А, стр.1", "+7 (495) 567-89-01", "metal@metalltrade.ru"),
    org("АО 'СтройМатериалы'", "legal", "7711223344", "771101001", "1167745678901",
        "127015, г.Москва, ул.Бутырская, д.86, офис 305", "+7 (495) 678-90-12", "info@stroymat.ru"),
    org("ООО 'ТехноПрофи'", "legal", "7733445566", "773301001", "1177756789012",
        "115201, г.Москва, Каширское шоссе, д.31, корп.1А", "+7 (495) 789-01-23", "order@technoprofi.ru"),
    org("ЗАО 'Пищепром'", "legal", "7744556677", "774401001", "1187767890123",
        "115114, г.Москва, ул.Летниковская, д.10, стр.4", "+7 (495) 890-12-34", "sales@foodprom.ru"),
    org("ООО 'ЛогистикГрупп'", "legal", "7755667788", "775501001", "1197778901234",
        "125040, г.Москва, ул.Правды, д.15, офис 210", "+7 (495) 901-23-45", "logist@logisticgroup.ru"),
    org("ИП Петров С.М.", "individual", "500400803204", "", "320774600567891",
        "119361, г.Москва, ул.Озерная, д.42, кв.15", "+7 (495) 012-34-56", "petrov@mail.ru"),
    org("ООО 'ЭкоПродукт'", "legal", "7766778899", "776601001", "1207789012345",
        "121096, г.Москва, ул.Барклая, д.8, стр.3", "+7 (495) 123-45-67", "eco@ecoproduct.ru"),
    org("АО 'ТрансАвто'", "legal", "7777889900", "777701001", "1217790123456",
        "109316, г.Москва, Волгоградский проспект, д.47", "+7 (495) 234-56-78", "trans@transauto.ru"),
    org("ООО 'ИТСервис'", "legal", "7788990011", "778801001", "1227801234567",
        "123557, г.Москва, ул.Краснопресненская, д.12", "+7 (495) 345-67-89", "support@itservice.ru"),
    org("ИП Сидорова А.К.", "individual", "500500903305", "", "321774600678902",
        "127273, г.Москва, ул.Яблочкова, д.21, кв.8", "+7 (495) 456-78-90", "sidorova@mail.ru"),
    org("ООО 'МедТехника'", "legal", "7799001122", "779901001", "1237812345678",
        "117218, г.Москва, ул.Кржижановского, д.15, корп.2", "+7 (495) 567-89-01", "med@medtech.ru"),
    org("ЗАО 'СтройИнвест'", "legal", "7800112233", "780001001", "1247823456789",
        "125190, г.Москва, ул.Космонавта Волкова, д.10", "+7 (495) 678-90-12", "invest@stroinvest.ru"),
    org("ООО 'АгроПродукт'", "legal", "7811223344", "781101001", "1257834567890",
        "115533, г.Москва, проспект Андропова, д.18", "+7 (495) 789-01-23", "agro@agroproduct.ru"),
    org("ИП Козлов В.П.", "individual", "500600100406", "", "322774600789013",
        "119634, г.Москва, ул.Авиаторов, д.7, кв.23", "+7 (495) 890-12-34", "kozlov@mail.ru"),
    org("ООО 'Безопасность+'", "legal", "7822334455", "782201001", "1267845678901",
        "127006, г.Москва, ул.Долгоруковская, д.6", "+7 (495) 901-23-45", "security@securityplus.ru"),
    org("АО 'ФинансКонсалт'", "legal", "7833445566", "783301001", "1277856789012",
        "125009, г.Москва, ул.Тверская, д.22А", "+7 (495) 012-34-56", "finance@finconsult.ru"),
];

const ROLES: [(&str, &str); 9] = [(ROLE_GENERAL_DIRECTOR, "Руководитель организации"),
                                  (ROLE_FINANCE_DIRECTOR, "Руководитель финансового отдела"),
                                  (ROLE_LAWYER, "Юридическая экспертиза"),
                                  (ROLE_PURCHASE_HEAD, "Руководитель отдела закупок"),
                                  (ROLE_SALES_HEAD, "Руководитель отдела продаж"),
                                  (ROLE_COMMERCIAL_DIRECTOR, "Руководитель коммерческой деятельности"),
                                  (ROLE_ADMIN, "Администратор системы"),
                                  (ROLE_SECURITY, "Проверка контрагентов"),
                                  (ROLE_LOGISTICS, "Логистическая экспертиза")];

/// (login, ФИО, contraseña, departamento, cargo, rol)
const USERS: [(&str, &str, &str, &str, &str, &str); 9] =
    [("admin", "Администратор Системы", "admin", "ИТ", "Администратор", ROLE_ADMIN),
     ("gen_dir", "Иванов Иван Иванович", "123", "Руководство", "Генеральный директор", ROLE_GENERAL_DIRECTOR),
     ("finance", "Петров Петр Петрович", "123", "Финансы", "Финансовый директор", ROLE_FINANCE_DIRECTOR),
     ("lawyer", "Сидорова Мария Ивановна", "123", "Юридический", "Юрист", ROLE_LAWYER),
     ("sales", "Козлов Алексей Владимирович", "123", "Продажи", "Начальник отдела продаж", ROLE_SALES_HEAD),
     ("purchase", "Николаев Дмитрий Сергеевич", "123", "Закупки", "Начальник отдела закупок", ROLE_PURCHASE_HEAD),
     ("commercial", "Федорова Ольга Петровна", "123", "Коммерция", "Коммерческий директор", ROLE_COMMERCIAL_DIRECTOR),
     ("security", "Алексеев Сергей Викторович", "123", "Безопасность", "Начальник СБ", ROLE_SECURITY),
     ("logistics", "Орлов Михаил Петрович", "123", "Логистика", "Начальник отдела логистики", ROLE_LOGISTICS)];

/// Grupo de expertos que revisa en paralelo en las rutas de compras y ventas.
const EXPERT_REVIEW: [&str; 4] = [ROLE_LAWYER, ROLE_FINANCE_DIRECTOR, ROLE_SECURITY, ROLE_LOGISTICS];

fn step(step: u32, role: &str, days: i64) -> FlowStep {
    FlowStep { step, role: role.to_string(), deadline_days: Some(days) }
}

fn purchase_route() -> Vec<FlowStep> {
    let mut steps: Vec<FlowStep> = EXPERT_REVIEW.iter().map(|role| step(1, role, 2)).collect();
    steps.push(step(2, ROLE_COMMERCIAL_DIRECTOR, 2));
    steps.push(step(3, ROLE_GENERAL_DIRECTOR, 3));
    steps
}

fn sales_route() -> Vec<FlowStep> {
    let mut steps = vec![step(1, ROLE_SALES_HEAD, 3)];
    steps.extend(EXPERT_REVIEW.iter().map(|role| step(2, role, 2)));
    steps.push(step(3, ROLE_COMMERCIAL_DIRECTOR, 2));
    steps.push(step(4, ROLE_GENERAL_DIRECTOR, 3));
    steps
}

/// (nombre, descripción, departamento, pasos)
fn flows() -> Vec<(&'static str, &'static str, &'static str, Vec<FlowStep>)> {
    vec![("Закупки", "Маршрут для договоров закупок", "Закупки", purchase_route()),
         ("Продажи", "Маршрут для договоров продаж", "Продажи", sales_route()),
         ("Общий", "Общий маршрут согласования", "Общий", purchase_route())]
}

/// (número, título, contraparte, importe, login del dueño, departamento, prioridad)
const CONTRACTS: [(&str, &str, &str, f64, &str, &str, &str); 50] = [
    ("Д-2025-001", "Поставка сырья для производства", "ООО 'Поставщик+'", 1500000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-002", "Закупка оборудования для цеха", "ООО 'МеталлТрейд'", 2500000.0, "purchase", "Закупки", "urgent"),
    ("Д-2025-003", "Поставка упаковочных материалов", "ООО 'СервисПро'", 500000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-004", "Закупка спецодежды для сотрудников", "ИП Иванова И.В.", 250000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-005", "Поставка электронных компонентов", "ООО 'ТехноПрофи'", 1800000.0, "purchase", "Закупки", "urgent"),
    ("Д-2025-006", "Закупка продуктов питания", "ЗАО 'Пищепром'", 1200000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-007", "Поставка логистических услуг", "ООО 'ЛогистикГрупп'", 800000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-008", "Закупка экологичной продукции", "ООО 'ЭкоПродукт'", 950000.0, "purchase", "Закупки", "custom"),
    ("Д-2025-009", "Поставка автотранспорта", "АО 'ТрансАвто'", 3500000.0, "purchase", "Закупки", "urgent"),
    ("Д-2025-010", "Закупка IT оборудования", "ООО 'ИТСервис'", 1200000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-011", "Поставка медицинского оборудования", "ООО 'МедТехника'", 2800000.0, "purchase", "Закупки", "urgent"),
    ("Д-2025-012", "Закупка строительных материалов", "ЗАО 'СтройИнвест'", 3200000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-013", "Поставка сельхозпродукции", "ООО 'АгроПродукт'", 750000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-014", "Закупка систем безопасности", "ООО 'Безопасность+'", 1600000.0, "purchase", "Закупки", "custom"),
    ("Д-2025-015", "Поставка финансовых услуг", "АО 'ФинансКонсалт'", 600000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-016", "Закупка канцелярских товаров", "ИП Петров С.М.", 180000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-017", "Поставка химических реактивов", "ООО 'Поставщик+'", 890000.0, "purchase", "Закупки", "urgent"),
    ("Д-2025-018", "Закупка мебели для офиса", "АО 'СтройМатериалы'", 1450000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-019", "Поставка промышленного оборудования", "ООО 'ТехноПрофи'", 4200000.0, "purchase", "Закупки", "urgent"),
    ("Д-2025-020", "Закупка программного обеспечения", "ООО 'ИТСервис'", 950000.0, "purchase", "Закупки", "standard"),
    ("Д-2025-021", "Реализация готовой продукции", "ТК 'Ашан'", 2500000.0, "sales", "Продажи", "standard"),
    ("Д-2025-022", "Продажа полуфабрикатов оптом", "ООО 'Поставщик+'", 1800000.0, "sales", "Продажи", "urgent"),
    ("Д-2025-023", "Экспорт продукции в ЕС", "ЗАО 'Пищепром'", 4800000.0, "sales", "Продажи", "custom"),
    ("Д-2025-024", "Реализация замороженных продуктов", "ИП Козлов В.П.", 920000.0, "sales", "Продажи", "standard"),
    ("Д-2025-025", "Продажа кондитерских изделий", "ТК 'Ашан'", 1650000.0, "sales", "Продажи", "urgent"),
    ("Д-2025-026", "Реализация мясной продукции", "ООО 'ЭкоПродукт'", 2100000.0, "sales", "Продажи", "standard"),
    ("Д-2025-027", "Продажа молочной продукции", "ИП Сидорова А.К.", 1350000.0, "sales", "Продажи", "standard"),
    ("Д-2025-028", "Реализация хлебобулочных изделий", "ООО 'АгроПродукт'", 980000.0, "sales", "Продажи", "custom"),
    ("Д-2025-029", "Продажа напитков и соков", "ТК 'Ашан'", 1250000.0, "sales", "Продажи", "standard"),
    ("Д-2025-030", "Реализация детского питания", "ООО 'Поставщик+'", 1850000.0, "sales", "Продажи", "urgent"),
    ("Д-2025-031", "Продажа диетических продуктов", "ООО 'ЭкоПродукт'", 760000.0, "sales", "Продажи", "standard"),
    ("Д-2025-032", "Реализация бакалейных товаров", "ИП Петров С.М.", 540000.0, "sales", "Продажи", "standard"),
    ("Д-2025-033", "Продажа замороженных полуфабрикатов", "ЗАО 'Пищепром'", 1980000.0, "sales", "Продажи", "urgent"),
    ("Д-2025-034", "Реализация консервированной продукции", "ТК 'Ашан'", 1120000.0, "sales", "Продажи", "standard"),
    ("Д-2025-035", "Продажа специй и приправ", "ИП Иванова И.В.", 320000.0, "sales", "Продажи", "custom"),
    ("Д-2025-036", "Реализация кофе и чая", "ООО 'АгроПродукт'", 870000.0, "sales", "Продажи", "standard"),
    ("Д-2025-037", "Продажа алкогольной продукции", "ТК 'Ашан'", 2450000.0, "sales", "Продажи", "urgent"),
    ("Д-2025-038", "Реализация табачных изделий", "ООО 'Поставщик+'", 1890000.0, "sales", "Продажи", "standard"),
    ("Д-2025-039", "Продажа кормов для животных", "ООО 'ЭкоПродукт'", 680000.0, "sales", "Продажи", "standard"),
    ("Д-2025-040", "Реализация бытовой химии", "ИП Козлов В.П.", 450000.0, "sales", "Продажи", "custom"),
    ("Д-2025-041", "Обслуживание оборудования", "ООО 'СервисПро'", 500000.0, "commercial", "Общий", "custom"),
    ("Д-2025-042", "Аренда складских помещений", "ЗАО 'СтройИнвест'", 1200000.0, "commercial", "Общий", "standard"),
    ("Д-2025-043", "Услуги охраны объекта", "ООО 'Безопасность+'", 680000.0, "commercial", "Общий", "standard"),
    ("Д-2025-044", "IT аутсорсинг", "ООО 'ИТСервис'", 950000.0, "commercial", "Общий", "urgent"),
    ("Д-2025-045", "Юридическое сопровождение", "АО 'ФинансКонсалт'", 420000.0, "commercial", "Общий", "standard"),
    ("Д-2025-046", "Транспортные услуги", "АО 'ТрансАвто'", 780000.0, "commercial", "Общий", "custom"),
    ("Д-2025-047", "Маркетинговые услуги", "ООО 'ТехноПрофи'", 560000.0, "commercial", "Общий", "standard"),
    ("Д-2025-048", "Консалтинговые услуги", "АО 'ФинансКонсалт'", 320000.0, "commercial", "Общий", "urgent"),
    ("Д-2025-049", "Ремонт офисных помещений", "АО 'СтройМатериалы'", 890000.0, "commercial", "Общий", "standard"),
    ("Д-2025-050", "Уборка производственных помещений", "ИП Сидорова А.К.", 280000.0, "commercial", "Общий", "custom"),
];

fn seed_organizations(conn: &mut SqliteConnection, now: NaiveDateTime) -> Result<usize, PersistenceError> {
    for o in &ORGANIZATIONS {
        let kpp = Some(o.kpp).filter(|v| !v.is_empty());
        diesel::insert_into(organizations::table).values((organizations::name.eq(o.name),
                                                          organizations::organization_type.eq(o.kind),
                                                          organizations::inn.eq(o.inn),
                                                          organizations::kpp.eq(kpp),
                                                          organizations::ogrn.eq(o.ogrn),
                                                          organizations::legal_address.eq(o.address),
                                                          organizations::phone.eq(o.phone),
                                                          organizations::email.eq(o.email),
                                                          organizations::created_at.eq(now)))
                                                 .execute(conn)?;
    }
    Ok(ORGANIZATIONS.len())
}

fn seed_roles(conn: &mut SqliteConnection) -> Result<usize, PersistenceError> {
    for (name, description) in ROLES {
        diesel::insert_into(roles::table).values((roles::name.eq(name), roles::description.eq(description)))
                                         .execute(conn)?;
    }
    Ok(ROLES.len())
}

fn seed_users(conn: &mut SqliteConnection, now: NaiveDateTime) -> Result<usize, PersistenceError> {
    for (username, full_name, password, department, position, role) in USERS {
        diesel::insert_into(users::table).values((users::username.eq(username),
                                                  users::full_name.eq(full_name),
                                                  users::password.eq(hash_password(password)),
                                                  users::department.eq(department),
                                                  users::position.eq(position),
                                                  users::is_active.eq(true),
                                                  users::created_at.eq(now)))
                                         .execute(conn)?;
        let user_id = last_insert_id(conn)?;
        let role_id = roles::table.filter(roles::name.eq(role))
                                  .select(roles::id)
                                  .first::<i32>(conn)
                                  .optional()?;
        match role_id {
            Some(role_id) => {
                diesel::insert_into(user_roles::table).values((user_roles::user_id.eq(user_id), user_roles::role_id.eq(role_id)))
                                                      .execute(conn)?;
            }
            None => warn!("seed: role '{role}' missing, user '{username}' left without role"),
        }
    }
    Ok(USERS.len())
}

fn seed_flows(conn: &mut SqliteConnection) -> Result<usize, PersistenceError> {
    let flows = flows();
    for (name, description, department, steps) in &flows {
        let json = serde_json::to_string(steps).map_err(|e| PersistenceError::Unknown(format!("flow '{name}' steps: {e}")))?;
        diesel::insert_into(approval_flows::table).values((approval_flows::name.eq(*name),
                                                           approval_flows::description.eq(*description),
                                                           approval_flows::department.eq(*department),
                                                           approval_flows::steps.eq(json)))
                                                  .execute(conn)?;
    }
    Ok(flows.len())
}

/// Contratos de demostración; se omiten los que no encuentran contraparte.
fn seed_contracts(conn: &mut SqliteConnection, now: NaiveDateTime) -> Result<usize, PersistenceError> {
    let org_ids: HashMap<String, i32> = organizations::table.select((organizations::name, organizations::id))
                                                            .load::<(String, i32)>(conn)?
                                                            .into_iter()
                                                            .collect();
    let user_ids: HashMap<String, i32> = users::table.select((users::username, users::id))
                                                     .load::<(String, i32)>(conn)?
                                                     .into_iter()
                                                     .collect();
    let mut inserted = 0;
    for (number, title, counterparty, amount, owner, department, priority) in CONTRACTS {
        let Some(org_id) = org_ids.get(counterparty) else {
            debug!("seed: contract {number} skipped, no organization '{counterparty}'");
            continue;
        };
        diesel::insert_into(contracts::table).values((contracts::contract_number.eq(number),
                                                      contracts::title.eq(title),
                                                      contracts::counterparty.eq(org_id.to_string()),
                                                      contracts::amount.eq(amount),
                                                      contracts::owner_id.eq(user_ids.get(owner).copied()),
                                                      contracts::department.eq(department),
                                                      contracts::status.eq(ContractStatus::Draft.as_str()),
                                                      contracts::priority.eq(priority),
                                                      contracts::created_at.eq(now),
                                                      contracts::updated_at.eq(now)))
                                             .execute(conn)?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Siembra cada tabla vacía dentro de una única transacción.
pub fn seed_if_empty<P: ConnectionProvider>(provider: &P, now: NaiveDateTime) -> Result<SeedReport, PersistenceError> {
    debug!("seed_if_empty:start");
    let report = with_retry(|| {
        let mut conn = provider.connection()?;
        conn.immediate_transaction(|tx| {
                let mut report = SeedReport::default();
                if organizations::table.count().get_result::<i64>(tx)? == 0 {
                    report.organizations = seed_organizations(tx, now)?;
                }
                if roles::table.count().get_result::<i64>(tx)? == 0 {
                    report.roles = seed_roles(tx)?;
                }
                if users::table.count().get_result::<i64>(tx)? == 0 {
                    report.users = seed_users(tx, now)?;
                }
                if approval_flows::table.count().get_result::<i64>(tx)? == 0 {
                    report.flows = seed_flows(tx)?;
                }
                if contracts::table.count().get_result::<i64>(tx)? == 0 {
                    report.contracts = seed_contracts(tx, now)?;
                }
                Ok::<_, PersistenceError>(report)
            })
    })?;
    if report.is_empty() {
        debug!("seed_if_empty:done nothing to seed");
    } else {
        info!("Database seeded: {} organizations, {} roles, {} users, {} flows, {} contracts",
              report.organizations,
              report.roles,
              report.users,
              report.flows,
              report.contracts);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sales_route_has_four_steps_with_parallel_experts() {
        let steps = sales_route();
        assert_eq!(steps.iter().map(|s| s.step).max(), Some(4));
        assert_eq!(steps.iter().filter(|s| s.step == 2).count(), 4);
        assert_eq!(steps[0].role, ROLE_SALES_HEAD);
    }

    #[test]
    fn demo_contracts_reference_seeded_organizations() {
        for (number, _, counterparty, ..) in CONTRACTS {
            assert!(ORGANIZATIONS.iter().any(|o| o.name == counterparty), "{number} -> {counterparty}");
        }
    }
}
