// self
use crate::obs::PassOutcome;

/// Records a finished resolution pass via the global metrics recorder (when enabled).
pub fn record_pass_outcome(outcome: PassOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("org_context_resolution_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
