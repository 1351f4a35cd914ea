use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use groove::catalog::SongCatalog;
use groove::library::DirectoryEnumerator;
use groove::settings::SettingsStore;

mod settings;

/// `groove [DIR] [QUERY...]`: list the library under DIR, or the best matches for QUERY.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let settings = settings::load_settings();

    let mut args = env::args().skip(1);
    let dir = args.next().map(PathBuf::from).unwrap_or_else(|| {
        env::current_dir().unwrap_or_else(|_| PathBuf::from("Music"))
    });
    let query = args.collect::<Vec<_>>().join(" ");

    let enumerator = Arc::new(DirectoryEnumerator::new(&dir, settings.library.clone()));
    let filter = Arc::new(SettingsStore::from_sync_settings(&settings.sync));
    let catalog = SongCatalog::new(enumerator, filter, &settings);

    let summary = catalog.fetch_blocking()?;
    info!(
        dir = %dir.display(),
        scanned = summary.scanned,
        songs = summary.admitted,
        "library loaded"
    );

    let library = &settings.library;
    let songs = if query.trim().is_empty() {
        SongCatalog::sort(
            &catalog.get_all(),
            library.default_sort,
            library.default_sort_reversed,
        )
    } else {
        catalog.search(&query)
    };

    let mut out = io::stdout().lock();
    for song in &songs {
        writeln!(
            out,
            "{}",
            song.display(&library.display_fields, &library.display_separator)
        )?;
    }
    Ok(())
}
