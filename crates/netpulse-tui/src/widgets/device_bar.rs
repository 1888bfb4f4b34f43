//! One-line device selector shown under the header.

use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use netpulse_core::Device;

use crate::theme;

/// Devices in backend order, numbered from 1 for the digit shortcuts. The
/// selected device is bracketed.
pub fn render_device_bar<'a>(devices: &'a [Device], selected: Option<usize>) -> Line<'a> {
    if devices.is_empty() {
        return Line::from(Span::styled("  No devices", theme::key_hint()));
    }

    let mut spans = Vec::with_capacity(devices.len() * 3 + 1);
    spans.push(Span::raw(" "));

    for (i, device) in devices.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme::key_hint()));
        }
        if i < 9 {
            spans.push(Span::styled(format!("{} ", i + 1), theme::key_hint()));
        }
        if Some(i) == selected {
            spans.push(Span::styled(
                format!("[{}]", device.display_name()),
                theme::tab_active().add_modifier(Modifier::UNDERLINED),
            ));
        } else {
            spans.push(Span::styled(device.display_name(), theme::tab_inactive()));
        }
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn brackets_selected_device() {
        let mut edge = Device::new("r2");
        edge.name = Some("edge".into());
        let devices = vec![Device::new("r1"), edge];
        assert_eq!(text(&render_device_bar(&devices, Some(1))), " 1 r1  2 [edge]");
    }

    #[test]
    fn empty_list() {
        assert_eq!(text(&render_device_bar(&[], None)), "  No devices");
    }
}
