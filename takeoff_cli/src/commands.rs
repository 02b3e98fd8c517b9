//! Command handlers

use crate::cli::{Cli, Commands, FleetAction, OutputFormat};
use crate::config::Config;
use crate::output::{blocks_table, fleet_table, output_summary, print_json};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use takeoff_core::file_io::with_session_extension;
use takeoff_core::materials::{catalog, install_catalog, BlockCatalog};
use takeoff_core::report::render_report;
use takeoff_core::{load_session, save_session, Aggregator, CalcError, Component, CostSource, Workbook};
use tracing::{debug, info};

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    if let Some(ref path) = config.block_catalog {
        let custom = BlockCatalog::load(path)?;
        install_catalog(custom)?;
    }

    let session = session_path(config.resolve_session(cli.session.as_deref()));
    let output_format = resolve_format(cli.format, &config);

    match cli.command {
        Commands::New { force } => cmd_new(&session, force),
        Commands::Blocks => cmd_blocks(output_format),
        Commands::Show { component } => cmd_show(&session, component.as_deref()),
        Commands::Set { assignments, no_calc } => cmd_set(&session, &assignments, no_calc),
        Commands::Reset { component } => cmd_reset(&session, component.as_deref()),
        Commands::Calc { component } => cmd_calc(&session, &component, output_format),
        Commands::Summary => cmd_summary(&session, output_format, &config.currency_symbol),
        Commands::Report { output } => cmd_report(&session, output),
        Commands::Fleet { action } => cmd_fleet(&session, action, output_format),
        Commands::Config {
            show,
            init,
            set_session,
            set_output,
            set_currency,
            set_catalog,
            reset,
        } => cmd_config(config, show, init, set_session, set_output, set_currency, set_catalog, reset),
    }
}

/// The `--format` flag wins over the configured default.
pub fn resolve_format(flag: Option<OutputFormat>, config: &Config) -> OutputFormat {
    flag.unwrap_or(config.output_format)
}

/// An existing file is used as named; a new one gets the session extension.
fn session_path(path: PathBuf) -> PathBuf {
    if path.exists() {
        path
    } else {
        with_session_extension(&path)
    }
}

/// Load the session, or start from defaults if the file does not exist yet.
fn open_workbook(path: &Path) -> Result<Workbook> {
    if path.exists() {
        load_session(path).with_context(|| format!("loading session {}", path.display()))
    } else {
        info!(path = %path.display(), "no session file yet; using defaults");
        Ok(Workbook::new())
    }
}

fn store(workbook: &Workbook, path: &Path) -> Result<()> {
    save_session(workbook, path).with_context(|| format!("saving session {}", path.display()))
}

fn parse_component(name: &str) -> Result<Component> {
    Component::from_str_flexible(name).map_err(|_| {
        anyhow!("unknown component '{name}' (expected masonry, fill, concrete, earthworks, labor or equipment)")
    })
}

/// Split `component.field.path=value`; the value is JSON when it parses, else a string.
pub fn parse_assignment(text: &str) -> Result<(Component, String, Value)> {
    let (target, raw) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("expected component.field=value, got '{text}'"))?;
    let (component, path) = target
        .trim()
        .split_once('.')
        .ok_or_else(|| anyhow!("expected component.field=value, got '{text}'"))?;
    let raw = raw.trim();
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((parse_component(component)?, path.to_string(), value))
}

fn cmd_new(session: &Path, force: bool) -> Result<()> {
    if session.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", session.display());
    }
    store(&Workbook::new(), session)?;
    println!("Created {}", session.display());
    Ok(())
}

fn cmd_blocks(format: OutputFormat) -> Result<()> {
    let blocks: Vec<_> = catalog().iter().collect();
    match format {
        OutputFormat::Json => print_json(&blocks),
        OutputFormat::Table => {
            print!("{}", blocks_table(catalog()));
            Ok(())
        }
    }
}

fn cmd_show(session: &Path, component: Option<&str>) -> Result<()> {
    let workbook = open_workbook(session)?;
    match component {
        Some(name) => print_json(&workbook.section(parse_component(name)?)?),
        None => print_json(&workbook.export_data()?),
    }
}

fn cmd_set(session: &Path, assignments: &[String], no_calc: bool) -> Result<()> {
    let mut workbook = open_workbook(session)?;
    let mut touched: Vec<Component> = Vec::new();

    for text in assignments {
        let (component, path, value) = parse_assignment(text)?;
        workbook
            .edit(component, &path, value)
            .with_context(|| format!("setting {text}"))?;
        if !touched.contains(&component) {
            touched.push(component);
        }
    }

    let mut rejected: Vec<(Component, CalcError)> = Vec::new();
    if !no_calc {
        for component in &touched {
            if let Err(e) = workbook.recalculate(*component) {
                rejected.push((*component, e));
            }
        }
    }

    store(&workbook, session)?;
    debug!(edits = assignments.len(), "inputs saved");

    if rejected.is_empty() {
        println!("Updated {} field(s) in {}", assignments.len(), session.display());
        return Ok(());
    }
    let details: Vec<String> = rejected
        .iter()
        .map(|(component, e)| format!("{}: {}", component.label(), e))
        .collect();
    bail!("inputs saved, but not calculable:\n  {}", details.join("\n  "))
}

fn cmd_reset(session: &Path, component: Option<&str>) -> Result<()> {
    let mut workbook = open_workbook(session)?;
    match component {
        Some(name) => {
            let component = parse_component(name)?;
            workbook.reset(component);
            println!("Reset {}", component.label());
        }
        None => {
            workbook.reset_all();
            println!("Reset all components");
        }
    }
    store(&workbook, session)
}

/// A component's current result as JSON.
fn result_value(workbook: &Workbook, component: Component) -> Result<Option<Value>> {
    let value = match component {
        Component::Masonry => workbook.masonry.output().map(serde_json::to_value),
        Component::FillMaterial => workbook.fill.output().map(serde_json::to_value),
        Component::Concrete => workbook.concrete.output().map(serde_json::to_value),
        Component::Earthworks => workbook.earthworks.output().map(serde_json::to_value),
        Component::Labor => workbook.labor.output().map(serde_json::to_value),
        Component::Equipment => workbook.equipment.output().map(serde_json::to_value),
    };
    Ok(value.transpose()?)
}

fn cmd_calc(session: &Path, component: &str, format: OutputFormat) -> Result<()> {
    let component = parse_component(component)?;
    let mut workbook = open_workbook(session)?;
    workbook.recalculate(component)?;

    let result = result_value(&workbook, component)?.unwrap_or(Value::Null);
    if format == OutputFormat::Json {
        return print_json(&result);
    }

    let source = workbook.source(component);
    println!("{}", component.label());
    println!("{}", "=".repeat(component.label().len()));
    if let Some(q) = source.headline() {
        println!("{}: {}", q.label, q.display_value());
    }
    if let Some(total) = source.total_cost() {
        println!("Total cost: {}", takeoff_core::format::money(total));
    }
    println!();
    match source.breakdown() {
        Some(text) => print!("{text}"),
        None => {
            if let Value::Object(fields) = result {
                for (key, value) in fields {
                    println!("{key:<30}{value}");
                }
            }
        }
    }
    Ok(())
}

fn cmd_summary(session: &Path, format: OutputFormat, currency: &str) -> Result<()> {
    let mut workbook = open_workbook(session)?;
    let mut aggregator = Aggregator::new();
    let summary = aggregator.refresh(&mut workbook);
    output_summary(format, summary, currency)
}

fn cmd_report(session: &Path, output: Option<PathBuf>) -> Result<()> {
    let mut workbook = open_workbook(session)?;
    let text = render_report(&mut workbook, &mut Aggregator::new());
    match output {
        Some(path) => {
            std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn cmd_fleet(session: &Path, action: FleetAction, format: OutputFormat) -> Result<()> {
    let mut workbook = open_workbook(session)?;
    match action {
        FleetAction::List => {
            let rows = &workbook.equipment.input().rows;
            return match format {
                OutputFormat::Json => print_json(rows),
                OutputFormat::Table => {
                    print!("{}", fleet_table(rows));
                    Ok(())
                }
            };
        }
        FleetAction::Add { name, rate, fuel, count } => {
            let input = workbook.equipment.input_mut();
            let index = input.add_row();
            let row = &mut input.rows[index];
            row.name = name;
            row.hourly_rate = rate;
            row.fuel_l_per_h = fuel;
            row.count = count;
            println!("Added row {index}: {}", row.display_name(index));
        }
        FleetAction::Remove { index } => {
            let removed = workbook.equipment.input_mut().remove_row(index)?;
            println!("Removed row {index}: {}", removed.display_name(index));
        }
    }
    store(&workbook, session)
}

#[allow(clippy::too_many_arguments)]
fn cmd_config(
    mut config: Config,
    show: bool,
    init: bool,
    set_session: Option<PathBuf>,
    set_output: Option<OutputFormat>,
    set_currency: Option<String>,
    set_catalog: Option<PathBuf>,
    reset: bool,
) -> Result<()> {
    if reset {
        config = Config::default();
        let path = config.save()?;
        println!("Configuration reset: {}", path.display());
        return Ok(());
    }

    if init {
        let path = Config::config_path()?;
        if path.exists() {
            bail!("{} already exists (use --reset to overwrite)", path.display());
        }
        Config::default().save_to(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let mut changed = false;
    if let Some(path) = set_session {
        config.session_path = Some(path);
        changed = true;
    }
    if let Some(format) = set_output {
        config.output_format = format;
        changed = true;
    }
    if let Some(symbol) = set_currency {
        config.currency_symbol = symbol;
        changed = true;
    }
    if let Some(path) = set_catalog {
        // reject a bad catalog before it is saved
        BlockCatalog::load(&path)?;
        config.block_catalog = Some(path);
        changed = true;
    }

    if changed {
        let path = config.save()?;
        println!("Configuration saved: {}", path.display());
    }

    if show || !changed {
        println!("Config file: {}", Config::config_path()?.display());
        print!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_parse_assignment_values() {
        let (component, path, value) = parse_assignment("masonry.wall_length=10.5").unwrap();
        assert_eq!(component, Component::Masonry);
        assert_eq!(path, "wall_length");
        assert_eq!(value, json!(10.5));

        let (component, path, value) = parse_assignment("labour.workforce.0.workers = 4").unwrap();
        assert_eq!(component, Component::Labor);
        assert_eq!(path, "workforce.0.workers");
        assert_eq!(value, json!(4));

        let (_, _, value) = parse_assignment("masonry.block_name=AAC 60 x 25 x 20 cm").unwrap();
        assert_eq!(value, json!("AAC 60 x 25 x 20 cm"));
    }

    #[test]
    fn test_resolve_format_prefers_flag_then_config() {
        let config = Config {
            output_format: OutputFormat::Json,
            ..Config::default()
        };
        assert_eq!(resolve_format(None, &config), OutputFormat::Json);
        assert_eq!(resolve_format(Some(OutputFormat::Table), &config), OutputFormat::Table);
        assert_eq!(resolve_format(None, &Config::default()), OutputFormat::Table);
    }

    #[test]
    fn test_parse_assignment_rejects_malformed() {
        assert!(parse_assignment("masonry.wall_length").is_err());
        assert!(parse_assignment("wall_length=3").is_err());
        assert!(parse_assignment("roofing.area=3").is_err());
    }

    #[test]
    fn test_set_then_summary_flow() {
        let dir = tempdir().unwrap();
        let session = dir.path().join("job.ashproj.json");

        cmd_set(
            &session,
            &["masonry.wall_length=10".to_string(), "masonry.wall_height=3".to_string()],
            false,
        )
        .unwrap();

        let mut workbook = load_session(&session).unwrap();
        let summary = Aggregator::new().refresh(&mut workbook).clone();
        assert!((summary.grand_total - 206.25).abs() < 1e-9);
    }

    #[test]
    fn test_set_saves_even_when_not_calculable() {
        let dir = tempdir().unwrap();
        let session = dir.path().join("bad.ashproj.json");

        let err = cmd_set(
            &session,
            &["fill.length_total=5".to_string(), "fill.width=6".to_string()],
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not calculable"));

        let workbook = load_session(&session).unwrap();
        assert_eq!(workbook.fill.input().length_total_m, 5.0);
    }

    #[test]
    fn test_fleet_add_and_remove() {
        let dir = tempdir().unwrap();
        let session = dir.path().join("fleet.ashproj.json");

        cmd_fleet(
            &session,
            FleetAction::Add { name: "Grader".to_string(), rate: 75.0, fuel: 16.0, count: 1 },
            OutputFormat::Table,
        )
        .unwrap();
        let workbook = load_session(&session).unwrap();
        assert_eq!(workbook.equipment.input().rows.len(), 9);
        assert_eq!(workbook.equipment.input().rows[8].name, "Grader");

        cmd_fleet(&session, FleetAction::Remove { index: 8 }, OutputFormat::Table).unwrap();
        let workbook = load_session(&session).unwrap();
        assert_eq!(workbook.equipment.input().rows.len(), 8);
    }

    #[test]
    fn test_session_path_extension() {
        let dir = tempdir().unwrap();
        let bare = dir.path().join("site");
        assert_eq!(session_path(bare.clone()), dir.path().join("site.ashproj.json"));

        let existing = dir.path().join("legacy.json");
        std::fs::write(&existing, "{}").unwrap();
        assert_eq!(session_path(existing.clone()), existing);
    }

    #[test]
    fn test_new_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let session = dir.path().join("fresh.ashproj.json");
        cmd_new(&session, false).unwrap();
        assert!(cmd_new(&session, false).is_err());
        cmd_new(&session, true).unwrap();
    }

    #[test]
    fn test_report_to_file() {
        let dir = tempdir().unwrap();
        let session = dir.path().join("r.ashproj.json");
        let out = dir.path().join("report.txt");
        cmd_report(&session, Some(out.clone())).unwrap();
        let text = std::fs::read_to_string(out).unwrap();
        assert!(text.contains("1.7 TOTAL PROJECT COST"));
    }
}
