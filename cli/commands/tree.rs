use crate::cli_args::TreeArgs;
use crate::output::{print_root_header, print_saved, print_summary_table, print_tree, write_to_file};
use crate::{interactive, roots_or_cwd, walk_config_for};
use anyhow::{Context, Result};
use gitree_core::output_formats::{self, ExportFormat, ExportOptions, RenderOptions};
use gitree_core::{Config, DirectorySummary, Entry, TreeData, walk};
use std::path::{Path, PathBuf};

struct Listed {
    root: PathBuf,
    config: Config,
    entries: Vec<Entry>,
}

pub fn handle_tree_command(args: TreeArgs, quiet: bool) -> Result<()> {
    let roots = roots_or_cwd(&args.paths);
    let mut listed = Vec::with_capacity(roots.len());
    for root in &roots {
        listed.push(list_root(root, &args)?);
    }

    let Some(first) = listed.first() else {
        return Ok(());
    };
    let emoji = args.emoji || first.config.output.emoji;
    if args.no_color || first.config.output.no_color {
        colored::control::set_override(false);
    }
    let render = RenderOptions {
        emoji,
        root_label: None,
    };

    if let Some(output_path) = &args.output {
        let format = match &args.format {
            Some(name) => ExportFormat::from_name(name)?,
            None => ExportFormat::from_path(output_path),
        };
        let content = export(&listed, format, &render, args.no_contents)?;
        write_to_file(output_path, &content)?;
        print_saved("Tree", output_path, quiet);
        return Ok(());
    }

    let stdout_format = match &args.format {
        Some(name) => ExportFormat::from_name(name)?,
        None => ExportFormat::from_name(&first.config.output.format)?,
    };
    if stdout_format != ExportFormat::Txt {
        let content = export(&listed, stdout_format, &render, args.no_contents)?;
        return crate::output::write_to_stdout(&content);
    }

    let multiple = listed.len() > 1;
    for (index, item) in listed.iter().enumerate() {
        if multiple {
            if index > 0 {
                println!();
            }
            print_root_header(&item.root);
        }
        print_tree(&output_formats::render_text_tree(&item.entries, &render))?;
        if args.summary {
            println!();
            print_summary_table(&DirectorySummary::from_entries(&item.entries));
        }
    }
    Ok(())
}

fn list_root(root: &Path, args: &TreeArgs) -> Result<Listed> {
    let (config, walk_config) = walk_config_for(root, &args.listing)?;
    let mut walker = walk(root, walk_config)
        .with_context(|| format!("Failed to start walking {}", root.display()))?;
    let entries: Vec<Entry> = walker.by_ref().collect();
    if walker.entry_limit_reached() {
        log::warn!(
            "Listing of {} stopped at the entry limit; use --no-max-entries to see everything",
            root.display()
        );
    }

    let entries = if args.interactive {
        interactive::select_entries(entries)?
    } else {
        entries
    };
    Ok(Listed {
        root: root.to_path_buf(),
        config,
        entries,
    })
}

fn export(
    listed: &[Listed],
    format: ExportFormat,
    render: &RenderOptions,
    no_contents: bool,
) -> Result<String> {
    let export_options = |config: &Config| ExportOptions {
        include_contents: !(no_contents || config.output.no_contents),
        max_file_size_bytes: config.max_file_size_bytes(),
        no_contents_for: config.output.no_contents_for.clone(),
    };

    match format {
        ExportFormat::Json | ExportFormat::Yaml => {
            let trees: Vec<TreeData> = listed
                .iter()
                .map(|item| output_formats::build_tree_data(&item.entries, &export_options(&item.config)))
                .collect();
            let content = match (format, trees.as_slice()) {
                (ExportFormat::Json, [single]) => output_formats::serialize_to_json(single),
                (ExportFormat::Json, many) => output_formats::serialize_to_json(many),
                (_, [single]) => output_formats::serialize_to_yaml(single),
                (_, many) => output_formats::serialize_to_yaml(many),
            }
            .with_context(|| format!("Failed to export tree as {:?}", format))?;
            Ok(content)
        }
        ExportFormat::Txt | ExportFormat::Markdown => {
            let mut parts = Vec::with_capacity(listed.len());
            for item in listed {
                let part = output_formats::render_export(
                    &item.entries,
                    format,
                    &export_options(&item.config),
                    render,
                )
                .with_context(|| format!("Failed to export {}", item.root.display()))?;
                parts.push(part);
            }
            let separator = if format == ExportFormat::Markdown { "\n" } else { "\n\n" };
            Ok(parts.join(separator))
        }
    }
}
