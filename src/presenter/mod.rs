use crate::report::SummaryRecord;
use std::{
    error::Error,
    time::{Duration, Instant},
};
use tracing::debug;

mod chart;
mod delimited;
mod json;
mod table;

pub use chart::{BarChart, SvgChart};
pub use delimited::CsvWriter;
pub use json::{write_json, JsonWriter};
pub use table::ConsoleTable;

/// Consumes the finished list of records.
pub trait Presenter {
    fn present(&mut self, records: &[SummaryRecord]) -> Result<(), Box<dyn Error>>;
}

pub struct PresenterInstance {
    name: String,
    presenter: Box<dyn Presenter>,
    run_time: Duration,
}

impl PresenterInstance {
    pub fn new(name: impl AsRef<str>, presenter: impl Presenter + 'static) -> Self {
        Self {
            name: name.as_ref().into(),
            presenter: Box::new(presenter),
            run_time: Duration::ZERO,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run_time(&self) -> Duration {
        self.run_time
    }

    fn present(&mut self, records: &[SummaryRecord]) -> Result<(), Box<dyn Error>> {
        let start = Instant::now();
        let result = self.presenter.present(records);
        self.run_time = start.elapsed();
        result.map_err(|e| format!("presenter '{}' failed: {e}", self.name).into())
    }
}

#[macro_export]
macro_rules! make_presenters {
    ($($name:expr => $presenter:expr),* $(,)?) => {
        vec![
            $($crate::presenter::PresenterInstance::new($name, $presenter),)*
        ]
    };
}

/// Runs every presenter in order. The first failure stops the rest.
pub fn run_presenters(
    presenters: &mut [PresenterInstance],
    records: &[SummaryRecord],
) -> Result<(), Box<dyn Error>> {
    for presenter in presenters.iter_mut() {
        presenter.present(records)?;
        debug!(
            presenter = presenter.name(),
            millis = presenter.run_time().as_millis() as u64,
            "presented"
        );
    }

    Ok(())
}


#[cfg(test)]
mod does {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    struct Tally(Rc<RefCell<Vec<&'static str>>>, &'static str, bool);

    impl Presenter for Tally {
        fn present(&mut self, _records: &[SummaryRecord]) -> Result<(), Box<dyn Error>> {
            self.0.borrow_mut().push(self.1);
            if self.2 {
                Err("boom".into())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn stop_at_first_failure() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut presenters = make_presenters![
            "first" => Tally(seen.clone(), "first", false),
            "second" => Tally(seen.clone(), "second", true),
            "third" => Tally(seen.clone(), "third", false),
        ];

        let err = run_presenters(&mut presenters, &testing::records()).unwrap_err();

        assert_eq!(*seen.borrow(), vec!["first", "second"]);
        assert!(err.to_string().contains("second"));
    }
}
