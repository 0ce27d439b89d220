use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use structopt::StructOpt;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use eth008::config::{Profile, Target};
use eth008::Session;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(StructOpt, Debug)]
#[structopt(
    name = "eth008",
    about = "View the IO states of an ETH008 relay module and toggle its outputs"
)]
struct Eth008 {
    /// Set the port number to talk to (defaults to 17494)
    #[structopt(short = "p", long)]
    port: Option<u16>,

    /// The password used for unlocking the module if tcp password is enabled
    #[structopt(short = "P", long)]
    password: Option<String>,

    /// Display the module information
    #[structopt(short = "m", long)]
    module_info: bool,

    /// Display the digital output states
    #[structopt(short = "o", long)]
    outputs: bool,

    /// Toggle digital output <io> (1 - 8)
    #[structopt(short = "t", long, value_name = "io")]
    toggle: Option<u8>,

    /// YAML profile providing address, port, password and timeout_ms
    #[structopt(short = "c", long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Log more (repeat for more detail); RUST_LOG takes precedence
    #[structopt(short = "v", long, parse(from_occurrences))]
    verbose: u8,

    /// IP address or host name of the module
    address: Option<String>,
}

type BoxResult<T> = ::std::result::Result<T, Box<dyn ::std::error::Error>>;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn connect(target: &Target) -> BoxResult<TcpStream> {
    let mut last_err = None;
    for addr in (target.address.as_str(), target.port).to_socket_addrs()? {
        debug!(%addr, "connecting");
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => {
                info!(%addr, "connected");
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(match last_err {
        Some(e) => format!("could not connect to {}:{}: {}", target.address, target.port, e).into(),
        None => format!("{} did not resolve to any address", target.address).into(),
    })
}

fn resolve(args: &Eth008) -> BoxResult<Target> {
    let file = match &args.config {
        Some(path) => Profile::load(path)?,
        None => Profile::default(),
    };
    let cli = Profile {
        address: args.address.clone(),
        port: args.port,
        password: args.password.clone(),
        timeout_ms: None,
    };
    Ok(file.merge(cli).resolve()?)
}

fn run(args: &Eth008, target: &Target) -> BoxResult<()> {
    let stream = connect(target)?;
    let mut session = Session::new(stream).with_timeout(target.timeout);

    if let Err(e) = session.authenticate(target.password.as_deref()) {
        if e.is_user_facing() {
            // nothing was unlocked, so there is nothing to log out of
            println!("{}", e);
            return Ok(());
        }
        return Err(e.into());
    }

    if args.module_info {
        print!("{}", session.module_info()?);
    }

    if let Some(output) = args.toggle {
        session.toggle_output(output)?;
    }

    if args.outputs {
        print!("{}", session.output_states()?);
    }

    let stream = session.logout()?;
    drop(stream);
    Ok(())
}

fn main() {
    let args = Eth008::from_args();
    init_logging(args.verbose);

    let target = match resolve(&args) {
        Ok(target) => target,
        Err(e) => {
            println!("{}", e);
            Eth008::clap().print_help().ok();
            println!();
            process::exit(1);
        }
    };
    debug!(?target, "resolved target");

    if let Err(e) = run(&args, &target) {
        error!("{}", e);
        process::exit(1);
    }
}
