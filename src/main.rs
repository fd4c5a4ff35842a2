//! Run every scenario against the in-memory reference provider.
//!
//! Usage: `rangecheck [config.toml]`. Without an argument, `rangecheck.toml`
//! in the working directory is layered over the defaults if it exists.
//! `RUST_LOG` overrides the configured log filter.

use std::process::ExitCode;

use rangecheck::config::Loader;
use rangecheck::config::OracleConfig;
use rangecheck::factory::RangeFactory;
use rangecheck::model::MemoryProvider;
use rangecheck::normalize::ProviderClass;
use rangecheck::outcome::Report;
use rangecheck::scenario;
use rangecheck::session::DocumentSession;
use rangecheck::session::SessionCache;
use samples::SampleText;
use tracing_subscriber::EnvFilter;

fn load_config() -> rangecheck::Result<OracleConfig> {
    let loader = match std::env::args().nth(1) {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file("rangecheck.toml"),
    };
    return loader.build();
}

fn init_logging(config: &OracleConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(config: &OracleConfig) -> Report {
    let mut total = Report::new();
    let mut cache = SessionCache::new(config.session.cache_capacity);
    let mut factory = RangeFactory::new(&config.factory);

    for class in ProviderClass::ALL {
        let mut provider = MemoryProvider::new(class);
        for sample in SampleText::ALL {
            let _span = tracing::info_span!("sample", %class, %sample).entered();

            match DocumentSession::establish(&mut provider, sample.text())
                .and_then(|session| scenario::move_count(&provider, &provider, &session, config))
            {
                Ok(table) => println!("{class} / {sample}\n{table}"),
                Err(err) => tracing::warn!(%err, "move count table unavailable"),
            }

            let report = scenario::run_all(&mut provider, sample.text(), config, &mut cache, &mut factory);
            tracing::info!(passed = report.passed, failed = report.failures.len(), faults = report.faults.len(), "sample done");
            total.absorb(report);
        }
    }
    return total;
}

fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("rangecheck: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);

    let report = run(&config);
    println!("{report}");
    if report.is_clean() {
        return ExitCode::SUCCESS;
    }
    return ExitCode::FAILURE;
}
