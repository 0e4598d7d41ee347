pub(crate) fn init(verbose: bool) -> Result<(), log::SetLoggerError> {
    let level = std::env::var("TABCAST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Off
        });
    fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(level)
        .chain(std::io::stderr())
        .apply()
}
