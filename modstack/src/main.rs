#![warn(clippy::pedantic)]

pub mod console;
pub mod preferences;

use anyhow::Result as AnyResult;

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "modstack.log" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        let _ = simple_logging::log_to_file("modstack.log", log::LevelFilter::Debug);
    }

    let preferences = preferences::Preferences::load();
    if let Err(e) = preferences.save() {
        log::warn!("Failed to save settings:\n{e:?}");
    };
    let mut console = console::Console::new(preferences.config);

    // Args are scripts to run, in order, before reading stdin.
    let paths: Vec<std::path::PathBuf> = std::env::args_os().skip(1).map(Into::into).collect();
    for path in &paths {
        let mut try_block = || -> AnyResult<usize> {
            let file = std::fs::File::open(path)?;
            console.run(std::io::BufReader::new(file), std::io::stdout().lock(), false)
        };
        match try_block() {
            Ok(0) => log::info!("ran {path:?}"),
            Ok(failures) => log::warn!("{failures} command(s) in {path:?} failed"),
            Err(e) => log::error!("failed to run {path:?}: {e:#}"),
        }
    }
    // Scripts alone run non-interactively, otherwise hand over to the user.
    if paths.is_empty() || has_term {
        console.run(std::io::stdin().lock(), std::io::stdout().lock(), has_term)?;
    }
    Ok(())
}
