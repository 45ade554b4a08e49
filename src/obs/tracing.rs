// self
use crate::{_prelude::*, obs::ResolveStage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedPass<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedPass<F> = F;

/// A span builder used by resolution passes.
#[derive(Clone, Debug)]
pub struct ResolveSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ResolveSpan {
	/// Creates a new span tagged with the provided stage + path.
	pub fn new(stage: ResolveStage, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("org_context.resolve", stage = stage.as_str(), path);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, path);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> ResolveSpanGuard {
		#[cfg(feature = "tracing")]
		{
			ResolveSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			ResolveSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedPass<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`ResolveSpan::entered`].
pub struct ResolveSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for ResolveSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ResolveSpanGuard(..)")
	}
}

/// Emits a `warn` event for a recovered failure.
pub fn warn_event(stage: ResolveStage, message: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(stage = stage.as_str(), "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, message);
	}
}

/// Emits a `debug` event for an expected, non-error condition.
pub fn debug_event(stage: ResolveStage, message: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(stage = stage.as_str(), "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, message);
	}
}
