//! persistent-counter entry point
//!
//! Native CLI over the persistent counter: each run loads the stored count,
//! applies one action, waits for the save and prints the result.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use anyhow::Result;
    use clap::{Parser, ValueEnum};
    use futures::executor::LocalPool;
    use web_time::SystemTime;

    use persistent_value::platform::{self, FileStore};
    use persistent_value::{Counter, PersistentValueBuilder, Settings, TextCodec};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    enum Action {
        /// Print the stored count
        Show,
        /// Add one
        Inc,
        /// Subtract one
        Dec,
        /// Set to zero
        Reset,
        /// Remove the stored count
        Clear,
    }

    #[derive(Debug, Parser)]
    #[command(name = "persistent-counter", version, about = "A counter that survives restarts")]
    struct Args {
        /// Settings file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding the store file (overrides settings)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Store key of the counter (overrides settings)
        #[arg(long)]
        key: Option<String>,

        #[arg(value_enum, default_value_t = Action::Show)]
        action: Action,
    }

    pub fn run() -> Result<()> {
        platform::init_logging();
        let args = Args::parse();

        let mut settings = match &args.config {
            Some(path) => Settings::load(path),
            None => Settings::default(),
        };
        if let Some(dir) = args.data_dir {
            settings.data_dir = dir;
        }
        if let Some(key) = args.key {
            settings.counter_key = key;
        }

        let store = FileStore::open(&settings.data_dir, &settings.namespace);
        log::info!("Using store {}", store.path().display());

        let mut pool = LocalPool::new();
        let failures = Rc::new(Cell::new(0usize));
        let failed = Rc::clone(&failures);
        let value = PersistentValueBuilder::new(settings.counter_key.clone(), 0, TextCodec::new())
            .on_error(move |_| failed.set(failed.get() + 1))
            .spawn(store, pool.spawner());
        let counter = Counter::from_value(value);

        match args.action {
            Action::Show => {}
            Action::Inc => counter.increment(),
            Action::Dec => counter.decrement(),
            Action::Reset => counter.reset(),
            Action::Clear => counter.clear(),
        }
        pool.run_until(counter.value().settled());

        println!("{}", counter.count());
        if let Some(label) = counter.last_saved_label(SystemTime::now()) {
            println!("Saved {}", label.to_lowercase());
        }
        if counter.milestone_reached() {
            println!("Reached {}!", persistent_value::counter::MILESTONE);
        }

        if failures.get() > 0 {
            anyhow::bail!("{} storage error(s), see log", failures.get());
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    cli::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web build is driven from JS through `WebCounter`
}
