use crate::cli_args::ZipArgs;
use crate::output::print_saved;
use crate::{interactive, roots_or_cwd, walk_config_for};
use anyhow::{Context, Result};
use colored::*;
use gitree_core::archive::ArchiveWriter;
use gitree_core::{Entry, walk};

pub fn handle_zip_command(args: ZipArgs, quiet: bool) -> Result<()> {
    let roots = roots_or_cwd(&args.paths);
    let multiple = roots.len() > 1;

    let mut writer = ArchiveWriter::create(&args.archive)
        .with_context(|| format!("Failed to create archive {}", args.archive.display()))?;

    for root in &roots {
        let (_, walk_config) = walk_config_for(root, &args.listing)?;
        let walker = walk(root, walk_config.without_display_limits())
            .with_context(|| format!("Failed to start walking {}", root.display()))?;
        let walk_root = walker.root().to_path_buf();
        let entries: Vec<Entry> = walker.collect();
        let entries = if args.interactive {
            interactive::select_entries(entries)?
        } else {
            entries
        };

        // Several roots are kept apart under their own directory names.
        let prefix = multiple.then(|| {
            walk_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "root".to_string())
        });
        writer
            .add_entries(&entries, &walk_root, prefix.as_deref())
            .with_context(|| format!("Failed to archive {}", root.display()))?;
    }

    let stats = writer.finish().context("Failed to finalize archive")?;
    if !quiet {
        println!(
            "{} {} files, {} directories{}",
            "📦".blue(),
            stats.files.to_string().cyan(),
            stats.directories.to_string().cyan(),
            if stats.skipped > 0 {
                format!(" ({} skipped)", stats.skipped).yellow().to_string()
            } else {
                String::new()
            }
        );
    }
    print_saved("Archive", &args.archive, quiet);
    Ok(())
}
