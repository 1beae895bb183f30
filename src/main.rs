//! GripLock CLI
//!
//! Usage:
//!   griplock --demo                  # Scripted local squeeze, deterministic ticks
//!   griplock --serve                 # HTTP authority server
//!   griplock --demo --json          # JSON output per tick
//!   griplock --demo --squeeze-ratio 0.6 --cooldown 2.0

use clap::Parser;
use colored::Colorize;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use griplock::core::{
    run_server, AuthorityLink, AuthorityRuntime, GestureReporter, HttpRelayLink, PointSource,
    SharedPoint,
};
use griplock::types::{AuthorityCommand, Side, SqueezeConfig, Vec3};
use griplock::{DEFAULT_TICK_HZ, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "griplock",
    version = VERSION,
    about = "GripLock - server-authoritative two-hand squeeze gesture detection",
    long_about = "GripLock detects a two-handed squeeze gesture in a\n\
                  multi-participant session and fires a bounded-rate spawn\n\
                  event at the hands' midpoint.\n\n\
                  Each participant relays hand positions to a single\n\
                  authority; the authority captures the grip's resting width,\n\
                  and triggers when the hands are held below a fraction of it\n\
                  for a sustained duration.\n\n\
                  Modes:\n  \
                  --demo   Scripted local squeeze with deterministic ticks\n  \
                  --serve  HTTP authority server"
)]
struct Args {
    /// Run the scripted demo (default when no mode given)
    #[arg(short, long)]
    demo: bool,

    /// Run as HTTP authority server
    #[arg(short, long)]
    serve: bool,

    /// Run as a remote reporter: relay two scripted hands to the given
    /// command endpoint (e.g. http://host:3000/session/<id>/command)
    #[arg(long, value_name = "URL")]
    relay: Option<String>,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Print every evaluation tick instead of a readable subsample
    #[arg(short, long)]
    verbose: bool,

    /// Squeeze threshold as a fraction of the rest distance, in (0,1)
    #[arg(long, default_value_t = griplock::DEFAULT_SQUEEZE_RATIO)]
    squeeze_ratio: f32,

    /// Seconds the compression must hold before a trigger
    #[arg(long, default_value_t = griplock::DEFAULT_SUSTAIN_SECS)]
    sustain: f32,

    /// Seconds between consecutive triggers
    #[arg(long, default_value_t = griplock::DEFAULT_COOLDOWN_SECS)]
    cooldown: f32,

    /// Seconds before a position sample goes stale
    #[arg(long, default_value_t = griplock::DEFAULT_STALE_WINDOW_SECS)]
    stale_window: f32,

    /// Reporter relay cadence (Hz)
    #[arg(long, default_value_t = griplock::DEFAULT_RELAY_HZ)]
    relay_hz: f32,

    /// Authority evaluation cadence for the server loop (Hz)
    #[arg(long, default_value_t = DEFAULT_TICK_HZ)]
    tick_hz: f32,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "griplock=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = SqueezeConfig {
        squeeze_ratio: args.squeeze_ratio,
        sustain_time: args.sustain,
        cooldown: args.cooldown,
        stale_window: args.stale_window,
        relay_hz: args.relay_hz,
    };
    if let Err(e) = config.validate() {
        eprintln!("invalid configuration: {}", e);
        std::process::exit(2);
    }

    if args.serve {
        if let Err(e) = run_server(&args.addr, args.tick_hz).await {
            eprintln!("server error: {}", e);
            std::process::exit(1);
        }
    } else if let Some(ref endpoint) = args.relay {
        run_relay(endpoint, config).await;
    } else {
        run_demo(config, &args);
    }
}

/// Remote-reporter role: stream two scripted hands to a serving authority
/// over its command endpoint, alternating between rest span and a squeeze.
async fn run_relay(endpoint: &str, config: SqueezeConfig) {
    let link = Arc::new(HttpRelayLink::new(endpoint));
    let mut reporter = GestureReporter::new(
        link,
        Vec3::new(-1.0, 1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        config.relay_hz,
    );

    let hand_a: SharedPoint = Arc::new(RwLock::new(Vec3::new(-0.5, 1.0, 0.0)));
    let hand_b: SharedPoint = Arc::new(RwLock::new(Vec3::new(0.5, 1.0, 0.0)));
    reporter.on_engage_start(1, Arc::clone(&hand_a) as Arc<dyn PointSource>);
    reporter.on_engage_start(2, Arc::clone(&hand_b) as Arc<dyn PointSource>);

    println!("relaying two scripted hands to {} (ctrl-c to stop)", endpoint);
    loop {
        tokio::time::sleep(Duration::from_secs(2)).await;
        println!("  squeezing");
        *hand_a.write().unwrap() = Vec3::new(-0.2, 1.0, 0.0);
        *hand_b.write().unwrap() = Vec3::new(0.2, 1.0, 0.0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        println!("  back to rest");
        *hand_a.write().unwrap() = Vec3::new(-0.5, 1.0, 0.0);
        *hand_b.write().unwrap() = Vec3::new(0.5, 1.0, 0.0);
    }
}

/// Scripted two-hand squeeze, driven by manual ticks so every run is
/// identical: engage at rest span, squeeze to a trigger, show the cooldown
/// refusing a second one, then release and re-grip at a narrower span.
fn run_demo(config: SqueezeConfig, args: &Args) {
    print_header(args.no_color);

    let (mut runtime, link) = AuthorityRuntime::new(config);
    runtime.authority_mut().set_sink(Box::new(|mid: Vec3| {
        println!("    >> spawn sink invoked at {}", mid);
    }));

    const DT: f32 = 1.0 / 60.0;
    let mut now = 0.0_f64;
    let mut tick_no = 0u32;

    let mut run_phase = |label: &str,
                         runtime: &mut AuthorityRuntime,
                         a: Option<Vec3>,
                         b: Option<Vec3>,
                         secs: f32| {
        println!("-- {}", label);
        let steps = (secs / DT).round() as u32;
        for _ in 0..steps {
            now += DT as f64;
            tick_no += 1;
            if let Some(p) = a {
                link.send(AuthorityCommand::Position { side: Side::A, position: p });
            }
            if let Some(p) = b {
                link.send(AuthorityCommand::Position { side: Side::B, position: p });
            }
            let out = runtime.step(now, DT);
            // Every 6th tick is enough to read; fired ticks always print
            if out.fired || args.verbose || tick_no % 6 == 0 {
                if args.json {
                    println!("{}", serde_json::to_string(&out).unwrap_or_default());
                } else if args.no_color {
                    println!("  {}", out.to_parseable_string());
                } else {
                    println!("  {}", out.to_terminal_string());
                }
            }
        }
    };

    let wide_a = Vec3::new(-0.5, 1.0, 0.0);
    let wide_b = Vec3::new(0.5, 1.0, 0.0);
    let tight_a = Vec3::new(-0.2, 1.0, 0.0);
    let tight_b = Vec3::new(0.2, 1.0, 0.0);

    link.send(AuthorityCommand::Engaged { side: Side::A });
    link.send(AuthorityCommand::Engaged { side: Side::B });
    run_phase("both hands engaged at rest span 1.0", &mut runtime, Some(wide_a), Some(wide_b), 0.3);
    run_phase("squeezing to span 0.4", &mut runtime, Some(tight_a), Some(tight_b), 0.3);
    run_phase("still squeezing inside the cooldown", &mut runtime, Some(tight_a), Some(tight_b), 0.5);
    run_phase("cooldown elapses, second trigger", &mut runtime, Some(tight_a), Some(tight_b), 0.6);

    link.send(AuthorityCommand::Disengaged { side: Side::B });
    run_phase("side B released, baseline cleared", &mut runtime, Some(wide_a), None, 0.2);

    link.send(AuthorityCommand::Engaged { side: Side::B });
    run_phase(
        "re-gripped at narrower span 0.6, fresh baseline",
        &mut runtime,
        Some(Vec3::new(-0.3, 1.0, 0.0)),
        Some(Vec3::new(0.3, 1.0, 0.0)),
        0.3,
    );

    println!();
    println!(
        "Done. triggers={} rest={:?}",
        runtime.authority().trigger_count(),
        runtime.authority().rest_distance(),
    );
}

fn print_header(no_color: bool) {
    if no_color {
        println!("GripLock v{} - squeeze demo", VERSION);
    } else {
        println!("{} {} - squeeze demo", "GripLock".bold().cyan(), format!("v{}", VERSION).dimmed());
    }
    println!();
}
