use clap::Parser;

use pledge::{Engine, UnhandledRejections};

#[derive(Parser, Debug, Clone)]
#[command(name = "aplus-runner", about = "Run the Promise/A+ conformance suite against pledge")]
pub struct Cli {
    /// Only run cases whose clause starts with this prefix, e.g. `2.3.3`.
    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    #[arg(long, default_value_t = false)]
    pub analyze: bool,

    /// Print the summary as JSON instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Cap on microtasks per drain; cases that need more are skipped.
    #[arg(long)]
    pub max_microtasks: Option<usize>,

    /// ignore, warn or error
    #[arg(long, default_value = "ignore")]
    pub unhandled_rejections: UnhandledRejections,
}

impl Cli {
    pub fn engine(&self) -> Engine {
        let engine = Engine::new().with_unhandled_rejections(self.unhandled_rejections);
        match self.max_microtasks {
            Some(limit) => engine.with_max_microtasks(limit),
            None => engine,
        }
    }
}
