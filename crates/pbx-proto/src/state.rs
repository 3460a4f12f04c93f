/// The eight TU states from spec §3. `Unknown` is an unused defensive
/// sentinel — the state machine never produces it, but `encode_state_line`
/// still handles it so a future state value can never panic the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TuState {
    OnHook,
    Ringing,
    DialTone,
    RingBack,
    BusySignal,
    Connected,
    Error,
    Unknown,
}

/// Render the exact line text for a state transition (§4.1), without the
/// CRLF terminator — callers append that when writing to a sink.
///
/// `ext` is the TU's own extension (used by `OnHook`); `peer_ext` is the
/// paired TU's extension (used by `Connected`). Both are ignored by
/// states that don't reference them.
pub fn encode_state_line(state: TuState, ext: Option<usize>, peer_ext: Option<usize>) -> String {
    match state {
        TuState::OnHook => format!("ON HOOK {}", ext.unwrap_or(0)),
        TuState::Ringing => "RINGING".to_string(),
        TuState::DialTone => "DIAL TONE".to_string(),
        TuState::RingBack => "RING BACK".to_string(),
        TuState::BusySignal => "BUSY SIGNAL".to_string(),
        TuState::Connected => format!("CONNECTED {}", peer_ext.map(|e| e as i64).unwrap_or(-1)),
        TuState::Error => "ERROR".to_string(),
        TuState::Unknown => "UNKNOWN STATE".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_hook_includes_extension() {
        assert_eq!(encode_state_line(TuState::OnHook, Some(3), None), "ON HOOK 3");
    }

    #[test]
    fn connected_includes_peer_extension() {
        assert_eq!(encode_state_line(TuState::Connected, Some(3), Some(7)), "CONNECTED 7");
    }

    #[test]
    fn simple_states_ignore_extensions() {
        assert_eq!(encode_state_line(TuState::Ringing, Some(3), Some(7)), "RINGING");
        assert_eq!(encode_state_line(TuState::DialTone, None, None), "DIAL TONE");
        assert_eq!(encode_state_line(TuState::RingBack, None, None), "RING BACK");
        assert_eq!(encode_state_line(TuState::BusySignal, None, None), "BUSY SIGNAL");
        assert_eq!(encode_state_line(TuState::Error, None, None), "ERROR");
    }
}
