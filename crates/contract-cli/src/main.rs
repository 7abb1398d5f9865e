use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use contract_core::{CoreEngineError, TaskOutcome};
use contract_domain::{format_amount, format_timestamp, now_local, parse_amount, parse_timestamp, ContractDraft, DomainError,
                      OrganizationDraft, OrganizationType, Priority, Session, UserDraft};
use contract_infra::{init_logging, AppConfig, ContractDesk, DeskError};
use log::debug;
use serde::Serialize;

// Códigos de salida
const EXIT_USAGE: u8 = 2;
const EXIT_VALIDATION: u8 = 3;
const EXIT_REFUSED: u8 = 4;
const EXIT_STORAGE: u8 = 5;

#[derive(Parser)]
#[command(name = "contractflow")]
#[command(about = "Contract registry and approval workflow")]
struct Cli {
    /// Archivo SQLite; por defecto `DATABASE_URL` o contracts.db
    #[arg(long, global = true)]
    db: Option<String>,
    #[arg(long, global = true, env = "CONTRACTS_USER")]
    user: Option<String>,
    #[arg(long, global = true, env = "CONTRACTS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Copia las líneas del log a stdout
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crea el esquema y siembra las tablas vacías
    Init,
    Stats,
    Org {
        #[command(subcommand)]
        command: OrgCommand,
    },
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    Contract {
        #[command(subcommand)]
        command: ContractCommand,
    },
    /// Envía un contrato en borrador a aprobación
    Submit { contract_id: i32 },
    Approve {
        task_id: i32,
        #[arg(long, default_value = "")]
        comment: String,
    },
    Reject {
        task_id: i32,
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Historial de aprobación de un contrato
    Status { contract_id: i32 },
    /// Bandeja de tareas del usuario
    Tasks,
    /// Barrido de plazos vencidos
    Deadlines,
    Audit {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    Backup {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Borra la base y la recrea con los datos iniciales
    Reset {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum OrgCommand {
    List,
    Add(OrgArgs),
    Edit {
        id: i32,
        #[command(flatten)]
        fields: OrgArgs,
    },
    Delete { id: i32 },
}

#[derive(Clone, Copy, ValueEnum)]
enum OrgKind {
    Legal,
    Individual,
}

#[derive(Args)]
struct OrgArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    inn: String,
    #[arg(long = "type", value_enum, default_value = "legal")]
    kind: OrgKind,
    #[arg(long)]
    kpp: Option<String>,
    #[arg(long)]
    ogrn: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
}

impl OrgArgs {
    fn draft(self) -> OrganizationDraft {
        OrganizationDraft { name: self.name,
                            organization_type: match self.kind {
                                OrgKind::Legal => OrganizationType::Legal,
                                OrgKind::Individual => OrganizationType::Individual,
                            },
                            inn: self.inn,
                            kpp: self.kpp,
                            ogrn: self.ogrn,
                            legal_address: self.address,
                            phone: self.phone,
                            email: self.email }
    }
}

#[derive(Subcommand)]
enum UserCommand {
    List,
    Roles,
    Add(UserArgs),
    Edit {
        id: i32,
        #[command(flatten)]
        fields: UserArgs,
    },
    Delete { id: i32 },
}

#[derive(Args)]
struct UserArgs {
    #[arg(long)]
    login: String,
    #[arg(long)]
    name: String,
    /// En edición, omitirla conserva la contraseña actual
    #[arg(long = "new-password")]
    new_password: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    position: Option<String>,
    #[arg(long = "role")]
    roles: Vec<String>,
    #[arg(long, default_value_t = false)]
    inactive: bool,
}

impl UserArgs {
    fn draft(self) -> UserDraft {
        UserDraft { username: self.login,
                    full_name: self.name,
                    password: self.new_password,
                    department: self.department,
                    position: self.position,
                    is_active: !self.inactive,
                    roles: self.roles }
    }
}

#[derive(Subcommand)]
enum ContractCommand {
    List {
        #[arg(long, default_value = "")]
        query: String,
    },
    Show { id: i32 },
    Add(ContractArgs),
    Edit {
        id: i32,
        #[command(flatten)]
        fields: ContractArgs,
        /// Permite editar un contrato aprobado devolviéndolo a borrador
        #[arg(long, default_value_t = false)]
        reopen: bool,
    },
    Delete { id: i32 },
    /// Cambia prioridad y plazo (directores y administradores)
    Deadline {
        id: i32,
        #[arg(long, value_enum)]
        priority: PriorityArg,
        #[arg(long)]
        deadline: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    Standard,
    Urgent,
    Custom,
}

impl From<PriorityArg> for Priority {
    fn from(p: PriorityArg) -> Self {
        match p {
            PriorityArg::Standard => Priority::Standard,
            PriorityArg::Urgent => Priority::Urgent,
            PriorityArg::Custom => Priority::Custom,
        }
    }
}

#[derive(Args)]
struct ContractArgs {
    #[arg(long)]
    number: String,
    #[arg(long)]
    title: String,
    /// Id de la organización contraparte
    #[arg(long)]
    counterparty: i32,
    /// Importe en formato `1 500 000,00`
    #[arg(long, default_value = "0")]
    amount: String,
    #[arg(long)]
    department: String,
    #[arg(long)]
    file: Option<String>,
    #[arg(long, value_enum, default_value = "standard")]
    priority: PriorityArg,
    /// `YYYY-MM-DD HH:MM:SS`, obligatorio con `--priority custom`
    #[arg(long)]
    deadline: Option<String>,
}

impl ContractArgs {
    fn draft(self) -> Result<ContractDraft, CliError> {
        Ok(ContractDraft { contract_number: self.number,
                           title: self.title,
                           counterparty_id: Some(self.counterparty),
                           amount: parse_amount(&self.amount),
                           department: self.department,
                           file_path: self.file,
                           priority: self.priority.into(),
                           custom_deadline: parse_deadline(self.deadline.as_deref())? })
    }
}

/// Error de la CLI con su código de salida.
struct CliError {
    code: u8,
    message: String,
}

impl CliError {
    fn usage(message: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: message.into() }
    }
}

impl From<DeskError> for CliError {
    fn from(err: DeskError) -> Self {
        let code = match &err {
            DeskError::InvalidCredentials => EXIT_REFUSED,
            DeskError::Domain(DomainError::Validation(_)) => EXIT_VALIDATION,
            DeskError::Domain(_) => EXIT_REFUSED,
            DeskError::Engine(CoreEngineError::DeadlineInPast | CoreEngineError::MissingCustomDeadline) => EXIT_VALIDATION,
            DeskError::Engine(CoreEngineError::Storage(_) | CoreEngineError::InvalidFlowDefinition(_)) => EXIT_STORAGE,
            DeskError::Engine(_) => EXIT_REFUSED,
            DeskError::Persistence(_) => EXIT_STORAGE,
        };
        Self { code, message: err.to_string() }
    }
}

fn parse_deadline(value: Option<&str>) -> Result<Option<NaiveDateTime>, CliError> {
    value.map(|v| parse_timestamp(v).map_err(|e| CliError { code: EXIT_VALIDATION, message: e.to_string() }))
         .transpose()
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            ExitCode::from(err.code)
        }
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<(), CliError> {
    if json {
        let out = serde_json::to_string_pretty(value).map_err(|e| CliError { code: EXIT_STORAGE, message: e.to_string() })?;
        println!("{out}");
    } else {
        println!("{}", text(value));
    }
    Ok(())
}

fn login(desk: &ContractDesk, cli: &Cli) -> Result<Session, CliError> {
    match (cli.user.as_deref(), cli.password.as_deref()) {
        (Some(user), Some(password)) => Ok(desk.login(user, password)?),
        _ => Err(CliError::usage("--user and --password (or CONTRACTS_USER / CONTRACTS_PASSWORD) are required")),
    }
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(db) = &cli.db {
        config = config.with_database(db.clone());
    }
    init_logging(&config, cli.verbose);
    let Some(command) = cli.command.as_ref() else {
        return Err(CliError::usage("missing command; see --help"));
    };
    debug!("cli:start db={}", config.db.file_path());
    let desk = ContractDesk::open(config.db.clone())?;
    let now = now_local();
    let json = cli.json;

    if let Commands::Init = command {
        let report = desk.initialize(now)?;
        return emit(json, &report, |r| {
            format!("seeded: {} organizations, {} roles, {} users, {} flows, {} contracts",
                    r.organizations, r.roles, r.users, r.flows, r.contracts)
        });
    }

    let session = login(&desk, &cli)?;
    match cli.command {
        None | Some(Commands::Init) => Ok(()),
        Some(Commands::Stats) => {
            let stats = desk.statistics()?;
            emit(json, &stats, |s| {
                format!("contracts: {}\non approval: {}\npending tasks: {}\nactive users: {}",
                        s.total_contracts, s.on_approval, s.pending_tasks, s.active_users)
            })
        }
        Some(Commands::Org { command }) => match command {
            OrgCommand::List => emit(json, &desk.organizations()?, |orgs| {
                                    orgs.iter()
                                        .map(|o| format!("{}\t{}\t{}\t{}", o.id, o.name, opt(&o.inn), o.organization_type.display_name()))
                                        .collect::<Vec<_>>()
                                        .join("\n")
                                }),
            OrgCommand::Add(fields) => {
                let id = desk.create_organization(&session, fields.draft(), now)?;
                println!("organization {id} created");
                Ok(())
            }
            OrgCommand::Edit { id, fields } => {
                desk.update_organization(&session, id, fields.draft())?;
                println!("organization {id} updated");
                Ok(())
            }
            OrgCommand::Delete { id } => {
                desk.delete_organization(&session, id)?;
                println!("organization {id} deleted");
                Ok(())
            }
        },
        Some(Commands::User { command }) => match command {
            UserCommand::List => emit(json, &desk.users(&session)?, |users| {
                                     users.iter()
                                          .map(|u| {
                                              format!("{}\t{}\t{}\t{}\t{}",
                                                      u.user.id,
                                                      u.user.username,
                                                      u.user.full_name,
                                                      opt(&u.user.department),
                                                      u.roles.join(", "))
                                          })
                                          .collect::<Vec<_>>()
                                          .join("\n")
                                 }),
            UserCommand::Roles => emit(json, &desk.roles()?, |roles| {
                                      roles.iter().map(|r| format!("{}\t{}", r.id, r.name)).collect::<Vec<_>>().join("\n")
                                  }),
            UserCommand::Add(fields) => {
                let id = desk.create_user(&session, &fields.draft(), now)?;
                println!("user {id} created");
                Ok(())
            }
            UserCommand::Edit { id, fields } => {
                desk.update_user(&session, id, &fields.draft())?;
                println!("user {id} updated");
                Ok(())
            }
            UserCommand::Delete { id } => {
                desk.delete_user(&session, id)?;
                println!("user {id} deleted");
                Ok(())
            }
        },
        Some(Commands::Contract { command }) => match command {
            ContractCommand::List { query } => emit(json, &desk.contracts(&session, &query, now)?, |lines| {
                                                   lines.iter()
                                                        .map(|l| {
                                                            let c = &l.listing;
                                                            format!("{}\t{}\t{}\t{}\t{}\t{}\t{}",
                                                                    c.id,
                                                                    opt(&c.contract_number),
                                                                    c.title,
                                                                    opt(&c.counterparty_name),
                                                                    format_amount(c.amount),
                                                                    c.status,
                                                                    l.tag.as_str())
                                                        })
                                                        .collect::<Vec<_>>()
                                                        .join("\n")
                                               }),
            ContractCommand::Show { id } => emit(json, &desk.contract(id)?, |c| {
                                                format!("{} {}\nstatus: {}\namount: {}\ndepartment: {}\npriority: {}\ndeadline: {}",
                                                        opt(&c.contract_number),
                                                        c.title,
                                                        c.status,
                                                        format_amount(c.amount),
                                                        opt(&c.department),
                                                        c.priority.display_name(),
                                                        c.deadline_at.as_ref().map(format_timestamp).unwrap_or_else(|| "-".into()))
                                            }),
            ContractCommand::Add(fields) => {
                let id = desk.create_contract(&session, &fields.draft()?, now)?;
                println!("contract {id} created");
                Ok(())
            }
            ContractCommand::Edit { id, fields, reopen } => {
                desk.update_contract(&session, id, &fields.draft()?, reopen, now)?;
                println!("contract {id} updated");
                Ok(())
            }
            ContractCommand::Delete { id } => {
                desk.delete_contract(&session, id)?;
                println!("contract {id} deleted");
                Ok(())
            }
            ContractCommand::Deadline { id, priority, deadline } => {
                let custom = parse_deadline(deadline.as_deref())?;
                let moved = desk.change_deadline(&session, id, priority.into(), custom, now)?;
                emit(json, &moved, |m| {
                    format!("contract {id}: deadline {} ({} pending task(s) moved)",
                            format_timestamp(&m.deadline),
                            m.moved_tasks)
                })
            }
        },
        Some(Commands::Submit { contract_id }) => {
            let outcome = desk.send_for_approval(&session, contract_id, now)?;
            emit(json, &outcome, |o| {
                format!("contract {contract_id} sent for approval: step {} with {} task(s), deadline {}",
                        o.step,
                        o.tasks.len(),
                        format_timestamp(&o.deadline))
            })
        }
        Some(Commands::Approve { task_id, comment }) => {
            let outcome = desk.approve_task(&session, task_id, &comment, now)?;
            emit(json, &outcome, describe_outcome)
        }
        Some(Commands::Reject { task_id, comment }) => {
            let outcome = desk.reject_task(&session, task_id, &comment, now)?;
            emit(json, &outcome, describe_outcome)
        }
        Some(Commands::Status { contract_id }) => emit(json, &desk.approval_status(contract_id)?, |view| {
            if view.is_empty() {
                return format!("contract {contract_id} was never sent for approval");
            }
            let mut out = Vec::new();
            for instance in &view.instances {
                out.push(format!("#{} {} [{}]", instance.id, instance.flow_name, instance.status));
                for t in &instance.tasks {
                    out.push(format!("  {}\t{}\t{}\t{}\t{}",
                                     t.step_order.unwrap_or_default(),
                                     opt(&t.role_name),
                                     opt(&t.assignee),
                                     opt(&t.status),
                                     opt(&t.comment)));
                }
            }
            out.join("\n")
        }),
        Some(Commands::Tasks) => emit(json, &desk.inbox(&session, now)?, |lines| {
                                     lines.iter()
                                          .map(|l| {
                                              let t = &l.task;
                                              format!("{}\t{}\t{}\t{}\t{}\t{}",
                                                      t.task_id,
                                                      opt(&t.contract_number),
                                                      t.title,
                                                      opt(&t.role_name),
                                                      t.deadline_at.as_ref().map(format_timestamp).unwrap_or_else(|| "-".into()),
                                                      l.tag.as_str())
                                          })
                                          .collect::<Vec<_>>()
                                          .join("\n")
                                 }),
        Some(Commands::Deadlines) => emit(json, &desk.check_deadlines(now)?, |overdue| {
                                         if overdue.is_empty() {
                                             return "no new overdue tasks".to_string();
                                         }
                                         overdue.iter().map(|t| format!("{}: {}", t.user_name, t.notice())).collect::<Vec<_>>().join("\n")
                                     }),
        Some(Commands::Audit { limit }) => emit(json, &desk.recent_audit(&session, limit)?, |rows| {
                                               rows.iter()
                                                   .map(|r| {
                                                       format!("{}\t{}\t{}",
                                                               r.created_at.as_ref().map(format_timestamp).unwrap_or_default(),
                                                               opt(&r.action),
                                                               opt(&r.details))
                                                   })
                                                   .collect::<Vec<_>>()
                                                   .join("\n")
                                           }),
        Some(Commands::Backup { dir }) => {
            let dir = dir.unwrap_or_else(|| config.backup_dir.clone());
            let path = desk.backup(&session, &dir, now)?;
            println!("backup created: {}", path.display());
            Ok(())
        }
        Some(Commands::Reset { yes }) => {
            if !yes {
                return Err(CliError::usage("reset deletes every record; confirm with --yes"));
            }
            let (_desk, report) = desk.reset(&session, now)?;
            emit(json, &report, |r| format!("database reset: {} contracts seeded", r.contracts))
        }
    }
}

fn describe_outcome(outcome: &TaskOutcome) -> String {
    match outcome {
        TaskOutcome::StepOpen { pending } => format!("approved; {pending} task(s) still pending at this step"),
        TaskOutcome::Advanced { step, tasks } => format!("approved; step {step} opened with {} task(s)", tasks.len()),
        TaskOutcome::Approved { instance_id } => format!("approved; contract approved (instance {instance_id})"),
        TaskOutcome::Rejected { instance_id, cancelled } => {
            format!("rejected; contract rejected (instance {instance_id}, {cancelled} task(s) cancelled)")
        }
    }
}
