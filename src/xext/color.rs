//! Color correction state of one X screen or display
//!
//! Holds the gamma device, the current contrast/brightness/gamma input and
//! the ramp last written to (or read from) the server.

use super::GammaDevice;
use crate::domain::{Channel, ColorMask, ColorValue, GammaInput, GammaRamp};
use crate::error::CtrlResult;

pub struct ColorState {
    device: Box<dyn GammaDevice>,
    input: GammaInput,
    ramp: GammaRamp,
}

impl ColorState {
    /// Read the current ramp from `device`
    ///
    /// Fails with `BadArgument` for a ramp size the engine cannot fill.
    pub fn new(device: Box<dyn GammaDevice>) -> CtrlResult<Self> {
        let size = device.ramp_size()?;
        GammaRamp::check_size(size)?;
        let ramp = device.read_ramp(size)?;
        Ok(Self {
            device,
            input: GammaInput::default(),
            ramp,
        })
    }

    pub fn attributes(&self) -> GammaInput {
        self.input
    }

    /// Assign the values selected in `mask` to the channels selected in
    /// `mask`, recompute those channels and write the ramp
    pub fn set(
        &mut self,
        contrast: [f32; 3],
        brightness: [f32; 3],
        gamma: [f32; 3],
        mask: ColorMask,
    ) -> CtrlResult<()> {
        let channels = mask & ColorMask::ALL_CHANNELS;
        for (value, values) in [
            (ColorValue::Contrast, contrast),
            (ColorValue::Brightness, brightness),
            (ColorValue::Gamma, gamma),
        ] {
            if mask.contains(value.mask()) {
                self.input.assign(value, values, channels);
            }
        }

        self.ramp.update(&self.input, channels);
        self.device.write_ramp(&self.ramp)
    }

    pub fn ramp(&self, channel: Channel) -> &[u16] {
        self.ramp.channel(channel)
    }

    pub fn ramp_size(&self) -> usize {
        self.ramp.size()
    }

    /// Re-read the ramp from the server
    pub fn reload(&mut self) -> CtrlResult<()> {
        let size = self.device.ramp_size()?;
        GammaRamp::check_size(size)?;
        self.ramp = self.device.read_ramp(size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CtrlError;
    use crate::mock::MockGammaDevice;

    #[test]
    fn test_new_reads_current_ramp() {
        let device = MockGammaDevice::new(256);
        let state = ColorState::new(Box::new(device.clone())).unwrap();
        assert_eq!(state.ramp_size(), 256);
        assert_eq!(state.ramp(Channel::Red)[255], 255 << 8);
        assert_eq!(state.attributes(), GammaInput::default());
        assert_eq!(device.write_count(), 0);
    }

    #[test]
    fn test_bad_ramp_size_rejected() {
        for size in [0, GammaRamp::MAX_SIZE + 1] {
            let result = ColorState::new(Box::new(MockGammaDevice::new(size)));
            assert!(matches!(result, Err(CtrlError::BadArgument)));
        }
    }

    #[test]
    fn test_set_updates_selected_channels_only() {
        let device = MockGammaDevice::new(256);
        let mut state = ColorState::new(Box::new(device.clone())).unwrap();
        let identity = state.ramp(Channel::Green).to_vec();

        state
            .set(
                [0.0; 3],
                [0.5; 3],
                [1.0; 3],
                ColorMask::RED | ColorMask::BRIGHTNESS,
            )
            .unwrap();

        assert_eq!(state.attributes().brightness(Channel::Red), 0.5);
        assert_eq!(state.attributes().brightness(Channel::Green), 0.0);
        assert_eq!(state.ramp(Channel::Green), identity.as_slice());
        assert!(state.ramp(Channel::Red)[0] > 0);

        assert_eq!(device.write_count(), 1);
        assert_eq!(device.ramp().channel(Channel::Red), state.ramp(Channel::Red));
    }

    #[test]
    fn test_set_clamps_input() {
        let mut state = ColorState::new(Box::new(MockGammaDevice::new(1024))).unwrap();
        state
            .set([5.0; 3], [0.0; 3], [50.0; 3], ColorMask::all())
            .unwrap();
        let input = state.attributes();
        for channel in Channel::ALL {
            assert_eq!(input.contrast(channel), 1.0);
            assert_eq!(input.gamma(channel), 10.0);
        }
    }

    #[test]
    fn test_reload_discards_local_ramp() {
        let device = MockGammaDevice::new(256);
        let mut state = ColorState::new(Box::new(device.clone())).unwrap();
        state
            .set([0.0; 3], [-1.0; 3], [1.0; 3], ColorMask::all())
            .unwrap();
        device.reset();
        state.reload().unwrap();
        assert_eq!(state.ramp(Channel::Blue)[255], 255 << 8);
    }
}
