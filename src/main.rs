//! JSAUX RGB dock control CLI.
//!
//! Lighting on the dock is owned by a backend daemon; this tool drives it
//! over the backend's control socket and re-fetches status instead of
//! tracking any device state locally.

use std::fmt::Display;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::{env, process};

use clap::builder::EnumValueParser;
use clap::{crate_description, crate_name, crate_version, Arg, ArgMatches, Command, ValueEnum};

use crate::dispatcher::CommandDispatcher;
use crate::poller::{fetch_state, StatusPoller};
use crate::remote::{RemoteCall, SocketClient};
use crate::state::{DeviceSnapshot, Effect, Rgb, Speed, NAMED_COLOURS};

mod dispatcher;
mod poller;
mod remote;
mod state;

/// Default backend control socket.
const DEFAULT_SOCKET: &str = "/run/dockrgb.sock";

fn main() {
    env_logger::init();

    let matches = cli().get_matches();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("\x1b[31mError:\x1b[0m unable to start runtime: {err}");
            process::exit(1);
        },
    };

    runtime.block_on(run(&matches));
}

async fn run(matches: &ArgMatches) {
    let client: Arc<dyn RemoteCall> = Arc::new(SocketClient::new(socket_path(matches)));
    let dispatcher = CommandDispatcher::new(client.clone());

    match matches.subcommand() {
        Some(("status", _)) => status(client.as_ref()).await,
        Some(("watch", _)) => watch(client.clone()).await,
        Some(("toggle", _)) => toggle(client.as_ref(), &dispatcher).await,
        Some(("effect", sub)) => effect(client.as_ref(), &dispatcher, sub).await,
        Some(("speed", sub)) => speed(client.as_ref(), &dispatcher, sub).await,
        Some(("colour", sub)) => colour(client.as_ref(), &dispatcher, sub).await,
        Some(("about", _)) => about(),
        _ => unreachable!("clap requires a subcommand"),
    }
}

/// Show the current dock status.
async fn status(client: &dyn RemoteCall) {
    print_status(&fetch_state(client).await);
}

/// Poll the dock and print every status change until interrupted.
async fn watch(client: Arc<dyn RemoteCall>) {
    let poller = StatusPoller::start(client);
    let mut rx = poller.subscribe();
    let mut last = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }

                let snapshot = *rx.borrow_and_update();
                if last != Some(snapshot) {
                    if last.is_some() {
                        println!();
                    }
                    print_status(&snapshot);
                    last = Some(snapshot);
                }
            },
        }
    }
}

/// Flip the lighting enable state.
async fn toggle(client: &dyn RemoteCall, dispatcher: &CommandDispatcher) {
    let snapshot = fetch_state(client).await;

    let enabled = !snapshot.enabled;
    dispatcher.set_state(enabled).await;

    println!("Lighting {}", if enabled { "\x1b[32menabled\x1b[0m" } else { "disabled" });
}

/// Select the lighting effect, prompting if it is not given on the CLI.
async fn effect(client: &dyn RemoteCall, dispatcher: &CommandDispatcher, matches: &ArgMatches) {
    let effect = match matches.get_one::<Effect>("effect") {
        Some(effect) => *effect,
        // Refresh the active selection before the menu opens.
        None => select_variant("effect", fetch_state(client).await.effect()),
    };

    dispatcher.set_effect(effect).await;
}

/// Select the effect speed, prompting if it is not given on the CLI.
async fn speed(client: &dyn RemoteCall, dispatcher: &CommandDispatcher, matches: &ArgMatches) {
    let speed = match matches.get_one::<Speed>("speed") {
        Some(speed) => *speed,
        None => select_variant("speed", fetch_state(client).await.speed()),
    };

    dispatcher.set_speed(speed).await;
}

/// Select the static colour, prompting if it is not given on the CLI.
async fn colour(client: &dyn RemoteCall, dispatcher: &CommandDispatcher, matches: &ArgMatches) {
    let colour = match cli_colour(matches) {
        Some(colour) => colour,
        None => select_colour(fetch_state(client).await.colour),
    };

    dispatcher.set_colour(colour).await;
}

/// Print the about page.
fn about() {
    println!("{} {}", crate_name!(), crate_version!());
    println!("{}", crate_description!());
    println!();
    println!("An unofficial lighting effect controller for the JSAUX RGB Dock.");
    println!("(Tested only on the HB1201S)");
    println!();
    println!("Issues, bugs and $$$ - {}", env!("CARGO_PKG_REPOSITORY"));
}

/// Render one status snapshot.
fn print_status(snapshot: &DeviceSnapshot) {
    if snapshot.connected {
        println!("\x1b[32mConnected\x1b[0m");
    } else {
        println!("\x1b[31mDisconnected\x1b[0m");
    }

    println!("Enabled: {}", if snapshot.enabled { "on" } else { "off" });
    println!("Effect: {}", snapshot.effect());

    // Speed only matters for animated effects, colour only for static.
    if snapshot.effect() == Effect::Static {
        println!("Colour: {} ({})", snapshot.colour.name(), snapshot.colour);
    } else {
        println!("Speed: {}", snapshot.speed());
    }
}

/// Resolve the backend socket path.
fn socket_path(matches: &ArgMatches) -> PathBuf {
    match matches.get_one::<String>("socket") {
        Some(path) => PathBuf::from(path),
        None => env::var_os("DOCKRGB_SOCKET")
            .map_or_else(|| PathBuf::from(DEFAULT_SOCKET), PathBuf::from),
    }
}

/// Read the colour option from the CLI, falling back to the menu on bad input.
fn cli_colour(matches: &ArgMatches) -> Option<Rgb> {
    let value = matches.get_one::<String>("colour")?;

    match Rgb::from_str(value) {
        Ok(colour) => Some(colour),
        Err(_) => {
            eprintln!(
                "\x1b[31mColour '{}' is neither a name nor a 0xRRGGBB value.\x1b[0m\n",
                value
            );
            None
        },
    }
}

/// Read an enum selection from STDIN, marking the active variant.
fn select_variant<T>(name: &str, active: T) -> T
where
    T: ValueEnum + Display + PartialEq + Copy,
{
    loop {
        println!("[{}] Please select a number:", name);
        let variants = T::value_variants();
        for (i, variant) in variants.iter().enumerate() {
            let marker = if *variant == active { "*" } else { " " };
            println!(" {}[{}] {}", marker, i, variant);
        }
        print!(" > ");
        let _ = io::stdout().flush();

        let input = stdin_nextline();

        match usize::from_str(&input).ok().and_then(|index| variants.get(index)) {
            Some(variant) => {
                println!();
                break *variant;
            },
            _ => println!("\x1b[31mVariant '{}' does not exist, please try again.\x1b[0m\n", input),
        }
    }
}

/// Read a colour selection from STDIN, marking the active colour.
fn select_colour(active: Rgb) -> Rgb {
    loop {
        println!("[colour] Please select a number:");
        for (i, (name, rgb)) in NAMED_COLOURS.iter().enumerate() {
            let marker = if *rgb == active { "*" } else { " " };
            println!(" {}[{}] {}", marker, i, name);
        }
        print!(" > ");
        let _ = io::stdout().flush();

        let input = stdin_nextline();

        match usize::from_str(&input).ok().and_then(|index| NAMED_COLOURS.get(index)) {
            Some((_, rgb)) => {
                println!();
                break *rgb;
            },
            _ => println!("\x1b[31mColour '{}' does not exist, please try again.\x1b[0m\n", input),
        }
    }
}

/// Read next line from STDIN.
#[inline]
fn stdin_nextline() -> String {
    let mut input = String::new();

    let _ = io::stdin().read_line(&mut input);
    input = input.trim().to_string();

    input
}

/// Get clap CLI parameters.
fn cli() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .author("Phil Howard <phil@gadgetoid.com>")
        .about(crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("socket")
                .help("Backend control socket path")
                .long("socket")
                .short('s')
                .global(true),
        )
        .subcommand(Command::new("status").about("Show dock connection and lighting status"))
        .subcommand(Command::new("watch").about("Poll the dock and print status changes"))
        .subcommand(Command::new("toggle").about("Toggle lighting output on or off"))
        .subcommand(
            Command::new("effect").about("Select the lighting effect").arg(
                Arg::new("effect")
                    .help("Lighting effect")
                    .ignore_case(true)
                    .value_parser(EnumValueParser::<Effect>::new()),
            ),
        )
        .subcommand(
            Command::new("speed").about("Select the effect speed").arg(
                Arg::new("speed")
                    .help("Pattern speed")
                    .ignore_case(true)
                    .value_parser(EnumValueParser::<Speed>::new()),
            ),
        )
        .subcommand(
            Command::new("colour")
                .about("Select the static colour")
                .arg(Arg::new("colour").help("Colour name or 0xRRGGBB value")),
        )
        .subcommand(Command::new("about").about("About this tool"))
}
