//! Layout scaler: fits a page authored at a fixed reference width into the
//! width the client actually has.
//!
//! The client reports its container width through a [`ContainerHandle`]; any
//! number of [`LayoutScaler`] subscriptions read the latest value. Updates are
//! idempotent and the last reported width wins. Until a positive width has
//! been reported the content renders hidden instead of at a wrong zoom.

use serde::Serialize;
use tokio::sync::watch;

use crate::errors::AppError;

/// A4 (210 mm) rendered at 96 dpi.
pub const A4_REFERENCE_WIDTH_PX: f64 = 794.0;
/// A4 (297 mm) rendered at 96 dpi.
pub const A4_REFERENCE_HEIGHT_PX: f64 = 1123.0;

/// Zoom and visibility derived from one width observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleState {
    /// Last measured width, `None` while unmeasured.
    pub width: Option<f64>,
    /// Uniform zoom applied to the whole content block. `0.0` while unmeasured.
    pub zoom: f64,
    pub visible: bool,
}

impl ScaleState {
    pub const UNMEASURED: ScaleState = ScaleState {
        width: None,
        zoom: 0.0,
        visible: false,
    };
}

/// Computes `width / reference_width`. Zero, negative and non-finite widths count as unmeasured.
pub fn compute_scale(width: Option<f64>, reference_width: f64) -> ScaleState {
    match width.filter(|w| w.is_finite() && *w > 0.0) {
        Some(w) => ScaleState {
            width: Some(w),
            zoom: w / reference_width,
            visible: true,
        },
        None => ScaleState::UNMEASURED,
    }
}

/// Checks a client-reported width before it enters the feed.
pub fn check_width(width: f64) -> Result<f64, AppError> {
    if !width.is_finite() || width < 0.0 {
        return Err(AppError::Validation(format!(
            "container width must be a non-negative number, got {width}"
        )));
    }
    Ok(width)
}

// ────────────────────────────────────────────────────────────────────────────
// Width feed
// ────────────────────────────────────────────────────────────────────────────

/// The measured container. Owns the width feed that scalers subscribe to.
#[derive(Debug)]
pub struct ContainerHandle {
    width: watch::Sender<Option<f64>>,
}

impl ContainerHandle {
    /// A container that has not been measured yet.
    pub fn new() -> Self {
        let (width, _) = watch::channel(None);
        Self { width }
    }

    /// Publishes a new width observation. Zero resets the container to unmeasured.
    pub fn resize(&self, width: f64) -> Result<(), AppError> {
        let width = check_width(width)?;
        let measured = (width > 0.0).then_some(width);
        self.width.send_if_modified(|current| {
            if *current == measured {
                false
            } else {
                *current = measured;
                true
            }
        });
        Ok(())
    }

    /// Registers a scaler for this container. Dropping the scaler unregisters it.
    pub fn observe(&self, reference_width: f64) -> LayoutScaler {
        LayoutScaler {
            width: self.width.subscribe(),
            reference_width,
        }
    }
}

impl Default for ContainerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscription to one container's width feed.
#[derive(Debug)]
pub struct LayoutScaler {
    width: watch::Receiver<Option<f64>>,
    reference_width: f64,
}

impl LayoutScaler {
    /// Scale for the most recent observation.
    pub fn current(&self) -> ScaleState {
        compute_scale(*self.width.borrow(), self.reference_width)
    }

    /// Waits for the next width change. Returns `None` once the container is gone.
    pub async fn changed(&mut self) -> Option<ScaleState> {
        self.width.changed().await.ok()?;
        Some(compute_scale(
            *self.width.borrow_and_update(),
            self.reference_width,
        ))
    }

    pub fn reference_width(&self) -> f64 {
        self.reference_width
    }
}
