use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use gitswitch::account::{AccountDraft, AccountUpdate, AuthType};
use gitswitch::app::App;
use gitswitch::cli::{Cli, Commands};
use gitswitch::error::AppError;
use gitswitch::menu::run_menu;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        println!("{}", err.to_string().red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut app = App::open()?;

    match cli.command {
        Some(Commands::Use { name }) => app.use_account(&name),
        Some(Commands::Add {
            name,
            username,
            email,
            ssh_key,
            ssh_host,
            token,
        }) => {
            let auth_type = match (&ssh_key, &token) {
                (Some(_), None) => AuthType::Ssh,
                (None, Some(_)) => AuthType::Token,
                _ => {
                    return Err(AppError::Validation(
                        "an account needs either --token or --ssh-key with --ssh-host".to_string(),
                    ));
                }
            };
            let draft = AccountDraft {
                name,
                username,
                email,
                auth_type,
                ssh_key_path: ssh_key,
                ssh_host,
            };
            app.add_account(draft, token.as_deref())
        }
        Some(Commands::Remove { name }) => app.remove_account(&name),
        Some(Commands::Update {
            name,
            new_name,
            username,
            email,
            ssh_key,
            ssh_host,
        }) => app.update_account(
            &name,
            AccountUpdate {
                name: new_name,
                username,
                email,
                auth_type: None,
                ssh_key_path: ssh_key,
                ssh_host,
            },
        ),
        Some(Commands::List) => app.list_accounts(),
        Some(Commands::Status) => app.status(),
        Some(Commands::Map {
            name,
            remote_pattern,
        }) => app.map_repo(&name, remote_pattern),
        Some(Commands::Unmap) => app.unmap_repo(),
        Some(Commands::Pin { name }) => app.pin_account(&name),
        None => run_menu(&mut app),
    }
}
