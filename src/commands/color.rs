//! Color command implementation
//!
//! Shows or changes contrast, brightness and gamma on an X screen
//! (XF86VidMode) or a display device (XRandR CRTC gamma).

use crate::cli::args::{ColorArgs, OutputFormat};
use crate::cli::output::{print_output, ColorReport, Message, RampDump};
use crate::domain::{gamma, Channel, ColorMask};
use crate::error::Result;
use crate::handle::AttributeHandle;
use crate::system::CtrlSystem;

/// Channel and value mask for the assignment in `args`
pub fn assignment_mask(args: &ColorArgs) -> ColorMask {
    let mut mask = if args.channels.is_empty() {
        ColorMask::ALL_CHANNELS
    } else {
        args.channels
            .iter()
            .fold(ColorMask::empty(), |mask, channel| mask | channel.mask())
    };
    mask.set(ColorMask::CONTRAST, args.contrast.is_some());
    mask.set(ColorMask::BRIGHTNESS, args.brightness.is_some());
    mask.set(ColorMask::GAMMA, args.gamma.is_some());
    mask
}

/// Apply the assignment in `args`, if any, and report the resulting state
pub fn apply_color(handle: &mut AttributeHandle, args: &ColorArgs) -> Result<ColorReport> {
    if args.is_assignment() {
        let mask = assignment_mask(args);
        log::debug!("Color assignment on {} with mask {:?}", handle.target(), mask);
        handle.set_color_attributes(
            [args.contrast.unwrap_or(gamma::CONTRAST_DEFAULT); 3],
            [args.brightness.unwrap_or(gamma::BRIGHTNESS_DEFAULT); 3],
            [args.gamma.unwrap_or(gamma::GAMMA_DEFAULT); 3],
            mask,
        )?;
    }
    color_report(handle, args.ramp)
}

/// Current color state of `handle`, with the ramp when `with_ramp` is set
pub fn color_report(handle: &AttributeHandle, with_ramp: bool) -> Result<ColorReport> {
    let mut report = ColorReport::new(handle.target().to_string(), &handle.color_attributes()?);
    if with_ramp {
        report.ramp = Some(RampDump {
            red: handle.color_ramp(Channel::Red)?.to_vec(),
            green: handle.color_ramp(Channel::Green)?.to_vec(),
            blue: handle.color_ramp(Channel::Blue)?.to_vec(),
        });
    }
    Ok(report)
}

/// Execute the color command
pub fn run_color(
    system: &mut CtrlSystem,
    args: &ColorArgs,
    format: OutputFormat,
    dry_run: bool,
) -> Result<()> {
    let handle = system.target_mut(args.target)?;

    if dry_run && args.is_assignment() {
        let msg = Message {
            message: format!(
                "[DRY RUN] Would apply {:?} to {}",
                assignment_mask(args),
                handle.target()
            ),
            success: true,
        };
        print_output(&msg, format)?;
        return Ok(());
    }

    let report = apply_color(handle, args)?;
    print_output(&report, format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeRegistry;
    use crate::domain::{ProtocolVersion, Target};
    use crate::error::{AppError, CtrlError};
    use crate::handle::HandleBuilder;
    use crate::mock::{MockGammaDevice, MockNvControl};
    use crate::xext::VidModeAttributes;
    use std::rc::Rc;

    fn screen(device: &MockGammaDevice) -> AttributeHandle {
        let vidmode =
            VidModeAttributes::with_device(ProtocolVersion::new(2, 2), Box::new(device.clone()))
                .unwrap();
        HandleBuilder::new(AttributeRegistry::standard().unwrap(), Target::x_screen(0))
            .nv_control(Rc::new(MockNvControl::new(ProtocolVersion::new(1, 29))))
            .with_vidmode(vidmode)
            .build()
            .unwrap()
    }

    fn args() -> ColorArgs {
        ColorArgs {
            target: Target::x_screen(0),
            channels: vec![],
            contrast: None,
            brightness: None,
            gamma: None,
            ramp: false,
        }
    }

    #[test]
    fn test_assignment_mask() {
        let mut color = args();
        color.gamma = Some(2.2);
        assert_eq!(
            assignment_mask(&color),
            ColorMask::ALL_CHANNELS | ColorMask::GAMMA
        );

        color.channels = vec![Channel::Green];
        color.contrast = Some(0.1);
        assert_eq!(
            assignment_mask(&color),
            ColorMask::GREEN | ColorMask::GAMMA | ColorMask::CONTRAST
        );
    }

    #[test]
    fn test_show_does_not_write() {
        let device = MockGammaDevice::new(256);
        let mut handle = screen(&device);
        let mut show = args();
        show.ramp = true;

        let report = apply_color(&mut handle, &show).unwrap();
        assert_eq!(device.write_count(), 0);
        assert_eq!(report.gamma, [1.0; 3]);
        let ramp = report.ramp.unwrap();
        assert_eq!(ramp.red.len(), 256);
        assert_eq!(ramp.blue[255], 255 << 8);
    }

    #[test]
    fn test_assign_one_channel() {
        let device = MockGammaDevice::new(256);
        let mut handle = screen(&device);
        let mut assign = args();
        assign.channels = vec![Channel::Red];
        assign.brightness = Some(-0.5);

        let report = apply_color(&mut handle, &assign).unwrap();
        assert_eq!(device.write_count(), 1);
        assert_eq!(report.brightness, [-0.5, 0.0, 0.0]);
        assert!(report.ramp.is_none());
    }

    #[test]
    fn test_assign_clamps() {
        let device = MockGammaDevice::new(256);
        let mut handle = screen(&device);
        let mut assign = args();
        assign.gamma = Some(100.0);

        let report = apply_color(&mut handle, &assign).unwrap();
        assert_eq!(report.gamma, [gamma::GAMMA_MAX; 3]);
    }

    #[test]
    fn test_color_on_gpu_rejected() {
        let mut handle =
            HandleBuilder::new(AttributeRegistry::standard().unwrap(), Target::gpu(0))
                .nv_control(Rc::new(MockNvControl::new(ProtocolVersion::new(1, 29))))
                .build()
                .unwrap();
        assert!(matches!(
            apply_color(&mut handle, &args()),
            Err(AppError::Ctrl(CtrlError::BadHandle))
        ));
    }
}
