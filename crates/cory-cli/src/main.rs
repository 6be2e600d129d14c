use clap::{Args as ClapArgs, Parser, Subcommand};
use cory_core::{DictLine, OpenMode, PathConfig, ScreenField};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cory",
    about = "Inspect and edit Chicory saves (_playdata and level_data)",
    version
)]
struct Cli {
    /// Save directory (overrides CHICORYSAVEPATH and the platform default)
    #[arg(long, global = true, value_name = "DIR")]
    save: Option<PathBuf>,
    /// level_data file (overrides CHICORYLEVELDATA and the platform default)
    #[arg(long, global = true, value_name = "FILE")]
    level_data: Option<PathBuf>,
    /// Skip backups when opening for writing
    #[arg(long, global = true, default_value_t = false)]
    no_backup: bool,
    /// More logging (-v info, -vv debug); RUST_LOG wins when set
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the resolved save directory and level_data path
    Where,
    /// Print the saved screen and position
    Screen,
    /// Move the save to another screen
    SetScreen(SetScreenArgs),
    /// Move the player within the screen
    SetPosition(SetPositionArgs),
    /// Read or edit the JSON lines of _playdata
    #[command(subcommand)]
    Playdata(PlaydataCmd),
    /// Read or edit level_data screens
    #[command(subcommand)]
    Level(LevelCmd),
    /// Print a screen's decoded geo grid
    Geo(GeoArgs),
    /// Zip the whole save directory next to it
    Snapshot,
}

#[derive(ClapArgs, Debug)]
struct SetScreenArgs {
    layer: i64,
    #[arg(allow_hyphen_values = true)]
    x: i64,
    #[arg(allow_hyphen_values = true)]
    y: i64,
}

#[derive(ClapArgs, Debug)]
struct SetPositionArgs {
    #[arg(allow_hyphen_values = true)]
    x: f64,
    #[arg(allow_hyphen_values = true)]
    y: f64,
}

#[derive(Subcommand, Debug)]
enum PlaydataCmd {
    /// Get value at JSON pointer
    Get(PointerArgs),
    /// Set value (raw JSON) at JSON pointer; an empty pointer replaces the line
    Set(PlaydataSetArgs),
    /// Remove key or array element at JSON pointer
    Remove(PointerArgs),
}

#[derive(ClapArgs, Debug)]
struct PointerArgs {
    /// state, character_states, decor, photos or paint
    field: String,
    /// JSON Pointer, e.g. /color_part_0
    #[arg(long, default_value = "")]
    ptr: String,
}

#[derive(ClapArgs, Debug)]
struct PlaydataSetArgs {
    #[command(flatten)]
    target: PointerArgs,
    /// New value as raw JSON (e.g., 123, true, "str", {"a":1})
    #[arg(long)]
    value: String,
}

#[derive(Subcommand, Debug)]
enum LevelCmd {
    /// List screen keys
    List,
    /// Print a screen, or one of its fields
    Get(LevelGetArgs),
    /// Set a screen field (raw JSON, coerced to the field's type)
    Set(LevelSetArgs),
    /// Print a screen's exits, or change some of them
    Exits(LevelExitsArgs),
}

#[derive(ClapArgs, Debug)]
struct LevelGetArgs {
    /// Screen key, e.g. 0_0_0
    screen: String,
    #[arg(long)]
    field: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct LevelSetArgs {
    screen: String,
    #[arg(long)]
    field: String,
    #[arg(long)]
    value: String,
}

#[derive(ClapArgs, Debug)]
struct LevelExitsArgs {
    screen: String,
    #[arg(long)]
    down: Option<bool>,
    #[arg(long)]
    up: Option<bool>,
    #[arg(long)]
    left: Option<bool>,
    #[arg(long)]
    right: Option<bool>,
}

#[derive(ClapArgs, Debug)]
struct GeoArgs {
    screen: String,
    /// Print the raw hex digits instead of a grid
    #[arg(long, default_value_t = false)]
    hex: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = PathConfig::platform_defaults();
    tracing::debug!(?config, "platform defaults");
    let ctx = Ctx {
        config: &config,
        save: cli.save,
        level_data: cli.level_data,
        backup: !cli.no_backup,
    };
    match cli.cmd.unwrap_or(Cmd::Screen) {
        Cmd::Where => cmd_where(&ctx),
        Cmd::Screen => cmd_screen(&ctx),
        Cmd::SetScreen(a) => cmd_set_screen(&ctx, a),
        Cmd::SetPosition(a) => cmd_set_position(&ctx, a),
        Cmd::Playdata(PlaydataCmd::Get(a)) => cmd_playdata_get(&ctx, a),
        Cmd::Playdata(PlaydataCmd::Set(a)) => cmd_playdata_set(&ctx, a),
        Cmd::Playdata(PlaydataCmd::Remove(a)) => cmd_playdata_remove(&ctx, a),
        Cmd::Level(LevelCmd::List) => cmd_level_list(&ctx),
        Cmd::Level(LevelCmd::Get(a)) => cmd_level_get(&ctx, a),
        Cmd::Level(LevelCmd::Set(a)) => cmd_level_set(&ctx, a),
        Cmd::Level(LevelCmd::Exits(a)) => cmd_level_exits(&ctx, a),
        Cmd::Geo(a) => cmd_geo(&ctx, a),
        Cmd::Snapshot => cmd_snapshot(&ctx),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

struct Ctx<'a> {
    config: &'a PathConfig,
    save: Option<PathBuf>,
    level_data: Option<PathBuf>,
    backup: bool,
}

impl Ctx<'_> {
    fn save(&self) -> cory_core::Save {
        self.config
            .find_save(self.save.as_deref())
            .unwrap_or_else(|e| {
                eprintln!("error: {}", e);
                std::process::exit(2);
            })
    }

    fn level_data(&self) -> cory_core::LevelData {
        self.config
            .find_level_data(self.level_data.as_deref())
            .unwrap_or_else(|e| {
                eprintln!("error: {}", e);
                std::process::exit(2);
            })
    }
}

fn exit_on_err<T>(res: cory_core::Result<T>, code: i32) -> T {
    res.unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(code);
    })
}

fn parse_json(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        eprintln!("invalid --value JSON: {}", e);
        std::process::exit(3);
    })
}

fn parse_or_exit<T: std::str::FromStr<Err = cory_core::Error>>(s: &str) -> T {
    exit_on_err(s.parse(), 3)
}

fn print_json(v: &Value) {
    match serde_json::to_string_pretty(v) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(5);
        }
    }
}

fn cmd_where(ctx: &Ctx) {
    for (what, res) in [
        ("save", ctx.config.resolve_save_dir(ctx.save.as_deref())),
        ("level_data", ctx.config.resolve_level_data(ctx.level_data.as_deref())),
    ] {
        match res {
            Ok((p, from)) => {
                let state = if p.exists() { "" } else { " (missing)" };
                println!("{}\t{}\t{}{}", what, from, p.display(), state);
            }
            Err(e) => println!("{}\t-\t{}", what, e),
        }
    }
}

fn cmd_screen(ctx: &Ctx) {
    let save = ctx.save();
    let (screen, position) = exit_on_err(
        save.playdata
            .open(OpenMode::Read, |doc| Ok((doc.screen()?, doc.position()?))),
        4,
    );
    println!("Screen: {:?}, Position: {:?}", screen, position);
}

fn cmd_set_screen(ctx: &Ctx, args: SetScreenArgs) {
    let save = ctx.save();
    exit_on_err(
        save.playdata.open_with(OpenMode::Write, ctx.backup, |doc| {
            doc.set_screen(&[args.layer, args.x, args.y])
        }),
        4,
    );
}

fn cmd_set_position(ctx: &Ctx, args: SetPositionArgs) {
    let save = ctx.save();
    exit_on_err(
        save.playdata
            .open_with(OpenMode::Write, ctx.backup, |doc| doc.set_position(&[args.x, args.y])),
        4,
    );
}

fn cmd_playdata_get(ctx: &Ctx, args: PointerArgs) {
    let field: DictLine = parse_or_exit(&args.field);
    let save = ctx.save();
    let found = exit_on_err(
        save.playdata.open(OpenMode::Read, |doc| {
            Ok(cory_core::get_pointer(doc.dict(field)?, &args.ptr))
        }),
        4,
    );
    match found {
        Some(v) => print_json(&v),
        None => {
            eprintln!("not found: {}", args.ptr);
            std::process::exit(3);
        }
    }
}

fn cmd_playdata_set(ctx: &Ctx, args: PlaydataSetArgs) {
    let field: DictLine = parse_or_exit(&args.target.field);
    let value = parse_json(&args.value);
    let ptr = args.target.ptr;
    let save = ctx.save();
    exit_on_err(
        save.playdata.open_with(OpenMode::Write, ctx.backup, |doc| {
            if ptr.is_empty() {
                doc.set_dict(field, value)
            } else {
                cory_core::set_pointer(doc.dict(field)?, &ptr, value)
            }
        }),
        4,
    );
}

fn cmd_playdata_remove(ctx: &Ctx, args: PointerArgs) {
    let field: DictLine = parse_or_exit(&args.field);
    let save = ctx.save();
    let removed = exit_on_err(
        save.playdata.open_with(OpenMode::Write, ctx.backup, |doc| {
            cory_core::remove_pointer(doc.dict(field)?, &args.ptr)
        }),
        4,
    );
    print_json(&removed);
}

fn cmd_level_list(ctx: &Ctx) {
    let level = ctx.level_data();
    let keys = exit_on_err(
        level.open(OpenMode::Read, |doc| {
            Ok(doc.keys().map(str::to_string).collect::<Vec<_>>())
        }),
        4,
    );
    for k in keys {
        println!("{}", k);
    }
}

fn cmd_level_get(ctx: &Ctx, args: LevelGetArgs) {
    let field: Option<ScreenField> = args.field.as_deref().map(parse_or_exit);
    let level = ctx.level_data();
    let value = exit_on_err(
        level.open(OpenMode::Read, |doc| {
            let screen = doc.get(&args.screen)?;
            Ok(match field {
                Some(f) => screen.field(f).unwrap_or(Value::Null),
                None => Value::Object(screen.to_serializable().clone()),
            })
        }),
        4,
    );
    print_json(&value);
}

fn cmd_level_set(ctx: &Ctx, args: LevelSetArgs) {
    let field: ScreenField = parse_or_exit(&args.field);
    // Bare words are taken as strings so `--value forest` works.
    let value = serde_json::from_str(&args.value).unwrap_or(Value::String(args.value.clone()));
    let level = ctx.level_data();
    exit_on_err(
        level.open_with(OpenMode::Write, ctx.backup, |doc| {
            doc.get(&args.screen)?.set_field(field, value)
        }),
        4,
    );
}

fn cmd_level_exits(ctx: &Ctx, args: LevelExitsArgs) {
    let changes = [args.down, args.up, args.left, args.right];
    let mode = if changes.iter().any(Option::is_some) {
        OpenMode::Write
    } else {
        OpenMode::Read
    };
    let level = ctx.level_data();
    let exits = exit_on_err(
        level.open_with(mode, ctx.backup, |doc| {
            let screen = doc.get(&args.screen)?;
            if mode.writable() {
                let exits = screen.exits_mut()?;
                for (flag, change) in [
                    (&mut exits.down, args.down),
                    (&mut exits.up, args.up),
                    (&mut exits.left, args.left),
                    (&mut exits.right, args.right),
                ] {
                    if let Some(v) = change {
                        *flag = v;
                    }
                }
            }
            Ok(screen.exits().clone())
        }),
        4,
    );
    println!(
        "{}\tdown={} up={} left={} right={}",
        exits, exits.down, exits.up, exits.left, exits.right
    );
}

fn cmd_geo(ctx: &Ctx, args: GeoArgs) {
    let level = ctx.level_data();
    let blob = exit_on_err(
        level.open(OpenMode::Read, |doc| {
            let screen = doc.get(&args.screen)?;
            screen.geo().map(str::to_string).ok_or_else(|| {
                cory_core::Error::NotFound(format!("geo of screen {:?}", args.screen))
            })
        }),
        4,
    );
    let grid = exit_on_err(cory_core::geo(&blob), 4);
    if args.hex {
        println!("{}", grid.to_hex());
        return;
    }
    for row in grid.rows() {
        let line: Vec<String> = row.iter().map(|c| c.iter().collect()).collect();
        println!("{}", line.join(" "));
    }
}

fn cmd_snapshot(ctx: &Ctx) {
    let save = ctx.save();
    let dest = exit_on_err(cory_core::snapshot_save_dir(save.location()), 5);
    println!("{}", dest.display());
}
