use env_logger::Env;
use std::io::{self, BufRead, Write};

pub(crate) fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

pub(crate) fn progress(message: &str) {
    log::info!("{message}");
}

pub(crate) fn verbose_enabled() -> bool {
    log::log_enabled!(log::Level::Info)
}

pub(crate) fn confirm(question: &str) -> bool {
    print!("{question} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut reply = String::new();
    if io::stdin().lock().read_line(&mut reply).is_err() {
        return false;
    }
    is_affirmative(&reply)
}

pub(crate) fn is_affirmative(reply: &str) -> bool {
    matches!(reply.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
