// contract-domain library entry point
pub mod contract;
pub mod error;
pub mod format;
pub mod organization;
pub mod user;
pub mod validation;

pub use contract::{Contract, ContractDraft, ContractListing, ContractStatus, Priority, GENERAL_DEPARTMENT};
pub use error::DomainError;
pub use format::{format_amount, format_phone, format_timestamp, hash_password, now_local, parse_amount, parse_timestamp};
pub use organization::{Organization, OrganizationDraft, OrganizationOption, OrganizationType};
pub use user::{Role, Session, User, UserDraft, UserWithRoles};
pub use validation::{validate_email, validate_inn, validate_kpp, validate_ogrn, validate_phone};
