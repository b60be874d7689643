use colored::Colorize;
use inquire::{Password, Select};

use crate::account::{Account, AccountDraft, AuthType};
use crate::app::App;
use crate::error::AppError;
use crate::validation::{
    prompt_until_valid, validate_input_email, validate_input_name, validate_input_required,
    validate_input_username,
};

/// Menu entry for leaving a submenu without acting
pub const BACK_OPTION: &str = "back";

/// Runs interactive menu interface
pub fn run_menu(app: &mut App) -> Result<(), AppError> {
    loop {
        let actions: Vec<&'static str> = vec![
            "switch account",
            "add account",
            "remove account",
            "show status",
            "list accounts",
            "quit",
        ];

        let action_selected: &'static str =
            Select::new(&format!("{}", "select action".blue()), actions).prompt()?;

        match action_selected {
            "switch account" => menu_switch_account(app)?,
            "add account" => menu_add_account(app)?,
            "remove account" => menu_remove_account(app)?,
            "show status" => app.status()?,
            "list accounts" => app.list_accounts()?,
            "quit" => {
                println!("{}", "quitting".yellow());
                break Ok(());
            }
            _ => unreachable!("unexpected input"),
        }
    }
}

/// Menu for switching accounts
fn menu_switch_account(app: &mut App) -> Result<(), AppError> {
    let accounts = app.accounts();
    if accounts.is_empty() {
        println!("{}", "no accounts to switch to".red());
        return Ok(());
    }

    let names = build_name_list(&accounts);
    let name_to_switch: String =
        Select::new(&format!("{}", "select account to switch:".blue()), names).prompt()?;

    if name_to_switch != BACK_OPTION {
        app.use_account(&name_to_switch)?;
    }
    Ok(())
}

/// Menu for adding a new account
fn menu_add_account(app: &mut App) -> Result<(), AppError> {
    let accounts = app.accounts();

    // Input validation
    let name: String = prompt_until_valid(&format!("{}", "enter account name:".blue()), |input| {
        validate_input_name(input, &accounts)
    })?;

    let username: String = prompt_until_valid(
        &format!("{}", "enter git username:".blue()),
        validate_input_username,
    )?;

    let email: String = prompt_until_valid(
        &format!("{}", "enter git email:".blue()),
        validate_input_email,
    )?;

    let auth_selected: &'static str = Select::new(
        &format!("{}", "select auth type".blue()),
        vec!["ssh", "token"],
    )
    .prompt()?;

    let (draft, token) = if auth_selected == "ssh" {
        let ssh_key_path: String =
            prompt_until_valid(&format!("{}", "enter ssh key path:".blue()), |input| {
                validate_input_required(input, "SSH key path")
            })?;
        let ssh_host: String =
            prompt_until_valid(&format!("{}", "enter ssh host alias:".blue()), |input| {
                validate_input_required(input, "SSH host alias")
            })?;
        (
            AccountDraft {
                name,
                username,
                email,
                auth_type: AuthType::Ssh,
                ssh_key_path: Some(ssh_key_path),
                ssh_host: Some(ssh_host),
            },
            None,
        )
    } else {
        let token: String = Password::new(&format!("{}", "enter access token:".blue()))
            .without_confirmation()
            .prompt()?;
        (
            AccountDraft {
                name,
                username,
                email,
                auth_type: AuthType::Token,
                ssh_key_path: None,
                ssh_host: None,
            },
            (!token.is_empty()).then_some(token),
        )
    };

    app.add_account(draft, token.as_deref())?;
    Ok(())
}

/// Menu for removing an account
fn menu_remove_account(app: &mut App) -> Result<(), AppError> {
    let accounts = app.accounts();
    if accounts.is_empty() {
        println!("{}", "no accounts to remove".red());
        return Ok(());
    }

    let names = build_name_list(&accounts);
    let name_to_remove: String =
        Select::new(&format!("{}", "select account to remove:".blue()), names).prompt()?;

    if name_to_remove != BACK_OPTION {
        app.remove_account(&name_to_remove)?;
    }
    Ok(())
}

/// Builds list of account names for the menu to display
fn build_name_list(accounts: &[Account]) -> Vec<String> {
    let mut names: Vec<String> = accounts.iter().map(|account| account.name.clone()).collect();
    names.push(BACK_OPTION.to_string());
    names
}
