use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use lifting_core::dashboard::SeriesPoint;
use lifting_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Personal lifting log and progress tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a Strong app CSV export into the log format
    Import {
        /// Strong export file
        file: PathBuf,

        /// Where to write the converted log (default: data dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also merge the converted sets into the main log, dropping duplicates
        #[arg(long)]
        merge: bool,
    },

    /// Log a training session
    Log {
        /// Workout title
        #[arg(long)]
        title: String,

        /// Session date (default: today)
        #[arg(long, value_parser = parse_calendar_date)]
        date: Option<NaiveDate>,

        /// Pre-populate sets from a template
        #[arg(long)]
        template: Option<String>,

        /// A set as 'exercise,weight,reps[,type[,rpe[,notes]]]' (repeatable)
        #[arg(long = "set")]
        sets: Vec<PlannedSet>,
    },

    /// Manage workout templates
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Manage the exercise list
    Exercise {
        #[command(subcommand)]
        action: ExerciseAction,
    },

    /// Show progress for an exercise (default: list exercises)
    Stats {
        /// Exercise to report on
        exercise: Option<String>,

        /// First date to include
        #[arg(long, value_parser = parse_calendar_date)]
        from: Option<NaiveDate>,

        /// Last date to include
        #[arg(long, value_parser = parse_calendar_date)]
        to: Option<NaiveDate>,

        /// Chart to print: max-weight, e1rm or load
        #[arg(long, default_value = "max-weight")]
        chart: ChartKind,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// Create a template from sets
    Create {
        name: String,

        /// A set as 'exercise,weight,reps[,type[,rpe[,notes]]]' (repeatable)
        #[arg(long = "set", required = true)]
        sets: Vec<PlannedSet>,

        /// Overwrite an existing template
        #[arg(long)]
        force: bool,
    },

    /// List templates
    List,

    /// Show a template's sets
    Show { name: String },
}

#[derive(Subcommand)]
enum ExerciseAction {
    /// Add an exercise name
    Add { name: String },

    /// List known exercises
    List,
}

fn main() -> Result<()> {
    // Initialize logging
    lifting_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = DataPaths::new(data_dir);

    match cli.command {
        Some(Commands::Import {
            file,
            output,
            merge,
        }) => cmd_import(&paths, &config, file, output, merge),
        Some(Commands::Log {
            title,
            date,
            template,
            sets,
        }) => cmd_log(&paths, title, date, template, sets),
        Some(Commands::Template { action }) => cmd_template(&paths, action),
        Some(Commands::Exercise { action }) => cmd_exercise(&paths, action),
        Some(Commands::Stats {
            exercise,
            from,
            to,
            chart,
        }) => cmd_stats(&paths, &config, exercise, DateRange { from, to }, chart),
        None => cmd_stats(&paths, &config, None, DateRange::default(), ChartKind::default()),
    }
}

/// Create the data layout and empty files on first use
fn bootstrap(paths: &DataPaths) -> Result<()> {
    paths.ensure_dirs()?;
    CsvLogStore::new(&paths.log_file).init()?;
    CsvExerciseRegistry::new(&paths.exercise_file).init()?;
    Ok(())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn cmd_import(
    paths: &DataPaths,
    config: &Config,
    file: PathBuf,
    output: Option<PathBuf>,
    merge: bool,
) -> Result<()> {
    let records = convert_strong_export(&file, config.delimiter_byte())?;
    let warmups = records.iter().filter(|r| !r.is_working()).count();

    let output = output.unwrap_or_else(|| paths.converted_log_file(today()));
    CsvLogStore::new(&output).save(&records)?;

    println!(
        "✓ Converted {} sets ({} working, {} warmup)",
        records.len(),
        records.len() - warmups,
        warmups
    );
    println!("  Output: {}", output.display());

    if merge {
        bootstrap(paths)?;
        let mut log = CsvLogStore::new(&paths.log_file);
        let outcome = merge_into(&mut log, &records)?;
        println!(
            "✓ Merged {} new sets into {} ({} duplicates skipped)",
            outcome.added,
            paths.log_file.display(),
            outcome.duplicates_dropped
        );
    }

    Ok(())
}

fn cmd_log(
    paths: &DataPaths,
    title: String,
    date: Option<NaiveDate>,
    template: Option<String>,
    sets: Vec<PlannedSet>,
) -> Result<()> {
    bootstrap(paths)?;
    let date = date.unwrap_or_else(today);

    let mut draft = match &template {
        Some(name) => {
            let template = JsonTemplateStore::new(&paths.template_dir).load(name)?;
            SessionDraft::from_template(title, date, &template)
        }
        None => SessionDraft::new(title, date),
    };

    for set in sets {
        draft.push(set);
    }

    if draft.sets.is_empty() {
        for set in prompt_sets()? {
            draft.push(set);
        }
    }

    let mut log = CsvLogStore::new(&paths.log_file);
    let mut registry = CsvExerciseRegistry::new(&paths.exercise_file);
    let records = draft.save(&mut log, &mut registry)?;

    println!("\n✓ Session logged! ({} sets)", records.len());
    for record in &records {
        println!(
            "  {:>2}. {:<24} {:>7.1} x {:<3} {}",
            record.set_order, record.exercise, record.weight, record.reps, record.set_type
        );
    }

    Ok(())
}

/// Read sets from stdin, one per line, until an empty line or EOF
fn prompt_sets() -> Result<Vec<PlannedSet>> {
    println!("Enter sets as 'exercise,weight,reps[,type[,rpe[,notes]]]'");
    println!("Empty line to finish.");

    let stdin = io::stdin();
    let mut sets = Vec::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            break;
        }

        match line.parse::<PlannedSet>() {
            Ok(set) => sets.push(set),
            Err(e) => eprintln!("  {}", e),
        }
    }
    Ok(sets)
}

fn cmd_template(paths: &DataPaths, action: TemplateAction) -> Result<()> {
    let mut store = JsonTemplateStore::new(&paths.template_dir);

    match action {
        TemplateAction::Create { name, sets, force } => {
            let template = Template::build(&name, sets)?;
            if store.exists(&template.name) && !force {
                return Err(Error::Validation(format!(
                    "Template '{}' already exists (use --force to overwrite)",
                    template.name
                )));
            }

            paths.ensure_dirs()?;
            store.save(&template)?;

            let mut registry = CsvExerciseRegistry::new(&paths.exercise_file);
            for set in &template.sets {
                registry.register(&set.exercise)?;
            }

            println!("✓ Template '{}' saved ({} sets)", template.name, template.sets.len());
        }
        TemplateAction::List => {
            let names = store.list()?;
            if names.is_empty() {
                println!("No templates yet.");
            }
            for name in names {
                println!("{}", name);
            }
        }
        TemplateAction::Show { name } => {
            let template = store.load(&name)?;
            println!("{}", template.name);
            for set in &template.sets {
                println!(
                    "  {:>2}. {:<24} {:>7.1} x {:<3} {}",
                    set.set_order.unwrap_or(0),
                    set.exercise,
                    set.weight,
                    set.reps,
                    set.set_type.map(|t| t.as_str()).unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

fn cmd_exercise(paths: &DataPaths, action: ExerciseAction) -> Result<()> {
    let mut registry = CsvExerciseRegistry::new(&paths.exercise_file);

    match action {
        ExerciseAction::Add { name } => {
            if name.trim().is_empty() {
                return Err(Error::Validation("Exercise name cannot be empty".into()));
            }
            if registry.register(&name)? {
                println!("✓ Added '{}' to exercise list.", name.trim());
            } else {
                println!("'{}' is already in the exercise list.", name.trim());
            }
        }
        ExerciseAction::List => {
            for name in registry.load()? {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn cmd_stats(
    paths: &DataPaths,
    config: &Config,
    exercise: Option<String>,
    range: DateRange,
    chart: ChartKind,
) -> Result<()> {
    let log = CsvLogStore::new(&paths.log_file);
    if !log.exists() {
        println!("No log file found. Please log a workout first.");
        return Ok(());
    }
    let records = log.load()?;

    let Some(exercise) = exercise else {
        let working = metrics::filter_working(&records);
        let names = metrics::exercise_names(&working);
        if names.is_empty() {
            println!("No working sets logged yet.");
        } else {
            println!("Exercises with working sets:");
            for name in names {
                println!("  {}", name);
            }
        }
        return Ok(());
    };

    let view = ExerciseView::build(&records, &exercise, range);
    let Some(summary) = view.summary() else {
        println!("No working sets for '{}' in the selected range.", exercise);
        return Ok(());
    };

    display_summary(&exercise, &summary);
    display_series(chart, &view.series(chart, config.dashboard.moving_average_window));
    display_sets(&view);

    Ok(())
}

fn display_summary(exercise: &str, summary: &ExerciseSummary) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", exercise);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  Sessions logged: {:<8} Max weight:       {:.1}",
        summary.sessions_logged, summary.max_weight
    );
    println!(
        "  Max est. 1RM:    {:<8.1} Avg reps/set:     {:.1}",
        summary.max_estimated_1rm, summary.avg_reps_per_set
    );
    println!(
        "  Total sets:      {:<8} Avg session load: {:.1}",
        summary.total_sets, summary.avg_session_load
    );
    println!();
}

fn display_series(chart: ChartKind, points: &[SeriesPoint]) {
    let title = match chart {
        ChartKind::MaxWeight => "Max Weight Over Time",
        ChartKind::EstimatedOneRepMax => "Estimated 1RM Over Time",
        ChartKind::SessionAverageLoad => "Session Average Load Over Time",
    };
    println!("  {}", title);
    println!("─────────────────────────────────────────");

    for point in points {
        match point.moving_average {
            Some(ma) => println!("  {}  {:>9.1}  (avg {:.1})", point.date, point.value, ma),
            None => println!("  {}  {:>9.1}", point.date, point.value),
        }
    }
    println!();
}

fn display_sets(view: &ExerciseView) {
    println!("  Set-Level Data");
    println!("─────────────────────────────────────────");
    for set in view.sets_newest_first() {
        let rir = set.rir.map(|r| format!("{:.0}", r)).unwrap_or_default();
        println!(
            "  {}  {:<16} {:>7.1} x {:<3} RIR {:<3} e1RM {:>7.1}  vol {:.0}",
            set.date, set.workout_title, set.weight, set.reps, rir, set.estimated_1rm, set.volume
        );
    }
}
