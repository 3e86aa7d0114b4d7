use clap::Args;
use scorekeep::app::AppController;
use scorekeep::error::SkResult;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Output file.
    pub path: String,

    /// Write every session as a versioned workbook.
    #[arg(short, long, default_value_t = false)]
    pub all: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// CSV file produced by `export`.
    pub path: String,
}

pub fn write_file(path: &Path, contents: &str) -> SkResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    Ok(())
}

pub fn export(app: &AppController, args: &ExportArgs) -> SkResult<()> {
    let contents = if args.all {
        app.export_all_csv()?
    } else {
        app.export_current_csv()?
    };
    write_file(Path::new(&args.path), &contents)?;
    info!("💾 Exported to {}", args.path);
    Ok(())
}

pub fn import(app: &mut AppController, args: &ImportArgs) -> SkResult<()> {
    let text = fs::read_to_string(&args.path)?;
    let ids = app.import_csv(&text)?;
    info!("✅ Imported {} session(s) from {}", ids.len(), args.path);
    Ok(())
}
