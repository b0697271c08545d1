include!(concat!(env!("OUT_DIR"), "/sentry_dsn.rs"));

use env_logger::{Builder, Env};
use sentry::ClientInitGuard;
use structopt::StructOpt;

use flowtag::cli::{CliCommand, GlobalOptions};

#[derive(StructOpt)]
#[structopt(
    name = env!("CARGO_PKG_NAME"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION")
)]
struct Opt {
    #[structopt(flatten)]
    global: GlobalOptions,

    #[structopt(subcommand)]
    cmd: CliCommand,
}

fn main() {
    let opt = Opt::from_args();

    Builder::from_env(Env::default().default_filter_or(opt.global.log_filter())).init();
    let mut _guard: Option<ClientInitGuard> = None;

    if SENTRY_DSN != "undefined" {
        _guard = Some(sentry::init((
            SENTRY_DSN,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        )));
    }

    if let Err(e) = opt.cmd.execute(&opt.global) {
        if e.is_declined() {
            eprintln!("{}", e);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}
