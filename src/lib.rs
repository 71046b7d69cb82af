#[macro_use]
extern crate tracing;

mod app;
mod logging;

pub use app::App;
pub use logging::init_logging;
pub use player_count_config::Args;

/// Installs the color-eyre report and panic hooks. Debug builds get better-panic backtraces.
pub fn init_errors() -> color_eyre::Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .display_location_section(cfg!(debug_assertions))
        .display_env_section(false)
        .into_hooks();
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        let report = panic_hook.panic_report(panic_info);
        error!("{report}");

        #[cfg(debug_assertions)]
        better_panic::Settings::auto()
            .most_recent_first(false)
            .lineno_suffix(true)
            .verbosity(better_panic::Verbosity::Full)
            .create_panic_handler()(panic_info);

        #[cfg(not(debug_assertions))]
        eprintln!("{report}");

        std::process::exit(1);
    }));
    Ok(())
}
