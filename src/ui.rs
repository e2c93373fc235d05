// UI layer: interactive menu built with `dialoguer`.
// Each flow is a small synchronous function; network calls run behind an
// `indicatif` spinner and failures are printed rather than ending the program.

use crate::config::{normalize_base_url, profile_path, ClientConfig, Profile};
use crate::error::WhapiError;
use crate::grade::Grade;
use crate::model::{AcademicGroup, Term};
use crate::session::Session;
use crate::term::select_current;
use anyhow::Result;
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::warn;

/// Entry point of the interactive client. Signs in, loads the context and
/// then loops over the term/class menu until the user chooses "Exit".
pub fn main_menu(config: Option<ClientConfig>) -> Result<()> {
    let path = profile_path();
    let mut profile = Profile::load(&path).unwrap_or_else(|e| {
        warn!("ignoring unreadable profile: {:#}", e);
        Profile::default()
    });

    let config = match config {
        Some(c) => c,
        None => ClientConfig::new(&prompt_base_url(&profile)?)?,
    };
    let mut session = Session::from_config(&config)?;

    let username = match sign_in(&mut session, &profile)? {
        Some(u) => u,
        None => return Ok(()),
    };
    profile.base_url = Some(config.base_url.clone());
    profile.username = Some(username);
    if let Err(e) = profile.save(&path) {
        warn!("could not save profile: {:#}", e);
    }

    with_spinner("Loading your school context...", || session.load_context())?;
    if let Some(org) = session.org_context() {
        println!("{}", org);
    }

    loop {
        let items = vec!["Classes this term", "Pick another term", "Exit"];
        let selection = Select::new().items(&items).default(0).interact()?;
        let term = match selection {
            0 => match with_spinner("Finding the current term...", || session.current_term()) {
                Ok(t) => Some(t),
                Err(e) => {
                    report(&e);
                    None
                }
            },
            1 => pick_term(&session)?,
            2 => break,
            _ => continue,
        };
        if let Some(term) = term {
            println!("{}", term);
            classes_menu(&mut session, &term)?;
        }
    }
    Ok(())
}

fn prompt_base_url(profile: &Profile) -> Result<String> {
    loop {
        let mut input = Input::<String>::new();
        input.with_prompt("Portal URL");
        if let Some(url) = &profile.base_url {
            input.default(url.clone());
        }
        let raw = input.interact_text()?;
        match normalize_base_url(&raw) {
            Ok(url) => return Ok(url),
            Err(e) => println!("{}", e),
        }
    }
}

/// Ask for credentials until sign-in works or the user gives up. Returns the
/// username that signed in.
fn sign_in(session: &mut Session, profile: &Profile) -> Result<Option<String>> {
    loop {
        let mut input = Input::<String>::new();
        input.with_prompt("Username");
        if let Some(u) = &profile.username {
            input.default(u.clone());
        }
        let username = input.interact_text()?;
        // `Password` hides input in terminal for passwords.
        let password = Password::new().with_prompt("Password").interact()?;

        match with_spinner("Signing in...", || session.sign_in(&username, &password)) {
            Ok(()) => {
                println!("Signed in as {}", username);
                return Ok(Some(username));
            }
            Err(e @ WhapiError::AuthenticationFailed(_)) => {
                println!("{}", e);
                if !Confirm::new().with_prompt("Try again?").interact()? {
                    return Ok(None);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn pick_term(session: &Session) -> Result<Option<Term>> {
    let terms = match with_spinner("Loading terms...", || session.fetch_term_list()) {
        Ok(t) => t,
        Err(e) => {
            report(&e);
            return Ok(None);
        }
    };
    if terms.is_empty() {
        println!("No terms for this school year.");
        return Ok(None);
    }
    let default = select_current(&terms)
        .ok()
        .and_then(|cur| terms.iter().position(|t| t == cur))
        .unwrap_or(0);
    let labels: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
    let idx = Select::new()
        .with_prompt("Term")
        .items(&labels)
        .default(default)
        .interact_opt()?;
    Ok(idx.map(|i| terms[i].clone()))
}

fn classes_menu(session: &mut Session, term: &Term) -> Result<()> {
    let groups = match with_spinner("Loading classes...", || session.fetch_groups(&term.duration_id)) {
        Ok(g) => g,
        Err(e) => {
            report(&e);
            return Ok(());
        }
    };
    if groups.is_empty() {
        println!("No classes in this term.");
        return Ok(());
    }

    let mut labels: Vec<String> = groups.iter().map(|g| g.to_string()).collect();
    labels.push("Back".into());
    loop {
        let idx = Select::new()
            .with_prompt("Class")
            .items(&labels)
            .default(0)
            .interact()?;
        match groups.get(idx) {
            Some(group) => show_assignments(session, group),
            None => return Ok(()),
        }
    }
}

fn show_assignments(session: &Session, group: &AcademicGroup) {
    let assignments = match with_spinner("Loading assignments...", || {
        session.fetch_assignments(&group.section_id)
    }) {
        Ok(a) => a,
        Err(e) => return report(&e),
    };
    if assignments.is_empty() {
        println!("No assignments yet in {}.", group.section_title);
        return;
    }

    let mut graded = Vec::new();
    for a in &assignments {
        match a.grade() {
            Ok(grade) => {
                println!("  {:<40} {:>10}", a.short_description, grade.to_string());
                if let Grade::Scored(s) = grade {
                    graded.push(s);
                }
            }
            Err(e) => println!("  {:<40} {}", a.short_description, e),
        }
    }
    if !graded.is_empty() {
        let mean = graded.iter().sum::<f64>() / graded.len() as f64;
        println!(
            "  {} of {} graded, average {}",
            graded.len(),
            assignments.len(),
            Grade::Scored(mean)
        );
    }
}

fn report(err: &WhapiError) {
    println!("{}", err);
}

/// Run `f` while a spinner shows `msg`.
fn with_spinner<T>(msg: &str, f: impl FnOnce() -> crate::Result<T>) -> crate::Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = f();
    spinner.finish_and_clear();
    result
}
