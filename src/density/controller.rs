// @file controller.rs
// @brief press/release and resize-debounce state machine

use crate::density::host::{DebounceTimer, PAN_ZOOM_MODE};
use crate::density::provider::DensityProvider;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InteractionState {
    #[default]
    Idle,
    Interacting,
    ResizePending,
}

/// Decides when a provider degrades or restores its resolution, and when the
/// surface keeps its previous image instead of recomputing.
///
/// Every transition returns whether the surface needs a redraw.
#[derive(Debug)]
pub struct InteractionController {
    state: InteractionState,
    update_while_interacting: bool,
    timer: Option<Box<dyn DebounceTimer>>,
}

impl InteractionController {
    pub fn new(update_while_interacting: bool) -> InteractionController {
        InteractionController {
            state: InteractionState::Idle,
            update_while_interacting,
            timer: None,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn update_while_interacting(&self) -> bool {
        self.update_while_interacting
    }

    pub fn set_update_while_interacting(&mut self, update: bool) {
        self.update_while_interacting = update;
    }

    pub fn set_timer(&mut self, timer: Option<Box<dyn DebounceTimer>>) {
        if let Some(old) = self.timer.as_mut() {
            old.stop();
        }
        self.timer = timer;
    }

    pub fn timer(&self) -> Option<&dyn DebounceTimer> {
        self.timer.as_deref()
    }

    pub fn supports_resize(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_frozen(&self) -> bool {
        match self.state {
            InteractionState::Idle => false,
            InteractionState::Interacting => !self.update_while_interacting,
            InteractionState::ResizePending => true,
        }
    }

    /// A press only counts while the host's toolbar is in pan/zoom; with no
    /// toolbar at all it is ignored.
    pub fn press<P>(&mut self, tool_mode: Option<&str>, provider: &mut P) -> bool
    where
        P: DensityProvider + ?Sized,
    {
        if self.state != InteractionState::Idle || tool_mode != Some(PAN_ZOOM_MODE) {
            return false;
        }
        if self.update_while_interacting && provider.downsample_factor() == 1 {
            // nothing would look different while panning
            return false;
        }
        self.force_press(InteractionState::Interacting, provider);
        true
    }

    fn force_press<P>(&mut self, state: InteractionState, provider: &mut P)
    where
        P: DensityProvider + ?Sized,
    {
        self.state = state;
        provider.downres();
        log::debug!("interaction state: {:?}", state);
    }

    pub fn release<P>(&mut self, provider: &mut P) -> bool
    where
        P: DensityProvider + ?Sized,
    {
        if self.state != InteractionState::Interacting {
            return false;
        }
        self.settle(provider);
        true
    }

    fn settle<P>(&mut self, provider: &mut P)
    where
        P: DensityProvider + ?Sized,
    {
        self.state = InteractionState::Idle;
        provider.upres();
        log::debug!("interaction state: {:?}", self.state);
    }

    /// Freezes the surface and (re)starts the debounce countdown. Ignored
    /// before the first render, without a timer, or mid pan/zoom.
    pub fn resize<P>(&mut self, has_rendered: bool, provider: &mut P) -> bool
    where
        P: DensityProvider + ?Sized,
    {
        if !has_rendered {
            return false;
        }
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        match self.state {
            InteractionState::Idle => {
                timer.start();
                self.force_press(InteractionState::ResizePending, provider);
            }
            InteractionState::ResizePending => timer.start(),
            InteractionState::Interacting => {}
        }
        false
    }

    pub fn timer_fired<P>(&mut self, provider: &mut P) -> bool
    where
        P: DensityProvider + ?Sized,
    {
        if let Some(timer) = self.timer.as_mut() {
            timer.stop();
        }
        if self.state != InteractionState::ResizePending {
            return false;
        }
        self.settle(provider);
        true
    }

    /// Stops and releases the timer; nothing fires after this.
    pub fn teardown(&mut self) {
        self.set_timer(None);
        self.state = InteractionState::Idle;
    }
}
