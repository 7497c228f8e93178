use clap::Subcommand;
use pomodoro_pro_core::LocalProfileAuth;

use super::{print_notices, CliResult, Context};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in as a profile and load its tasks
    Login {
        /// Profile name (defaults to `auth.default_user`)
        user: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show who is signed in
    Status,
}

pub fn run(action: AuthAction) -> CliResult {
    let ctx = Context::load()?;

    match action {
        AuthAction::Login { user } => {
            let profile = user.or_else(|| ctx.config.auth.default_user.clone());
            if profile.is_none() {
                return Err("no user given and auth.default_user is not set".into());
            }
            let mut provider = LocalProfileAuth::new(&ctx.dir, profile);
            let mut engine = ctx.engine()?;
            let signed_in = engine.sign_in(&mut provider);
            let events = engine.drain_events();
            print_notices(&events);
            match signed_in {
                Some(identity) => {
                    println!("Logged in as {}", identity.uid);
                    println!("{} task(s) loaded", engine.tree().len());
                }
                None if events.is_empty() => println!("Login cancelled"),
                None => return Err("login failed".into()),
            }
        }
        AuthAction::Logout => {
            if LocalProfileAuth::restore(&ctx.dir).is_none() {
                println!("Not logged in");
                return Ok(());
            }
            let mut engine = ctx.engine()?;
            let mut provider = LocalProfileAuth::new(&ctx.dir, None);
            let signed_out = engine.sign_out(&mut provider);
            print_notices(&engine.drain_events());
            if !signed_out {
                return Err("logout failed".into());
            }
        }
        AuthAction::Status => match ctx.engine()?.user() {
            Some(identity) => println!("Logged in as {}", identity.uid),
            None => println!("Not logged in"),
        },
    }
    Ok(())
}
