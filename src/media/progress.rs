//! Parsing of ffmpeg `-progress` key=value output.

/// Accumulated state of one `-progress` stream.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProgressState {
    pub out_time_secs: f64,
    pub complete: bool,
}

impl ProgressState {
    pub fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports out_time_ms in microseconds too.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.trim().parse::<f64>() {
                    self.out_time_secs = (us / 1_000_000.0).max(0.0);
                }
            }
            "progress" => {
                self.complete = value.trim() == "end";
            }
            _ => {}
        }
    }

    /// Feed one raw output line. Returns `true` when the line closes a progress block.
    pub fn feed_line(&mut self, line: &str) -> bool {
        let Some((key, value)) = line.trim().split_once('=') else {
            return false;
        };
        self.update(key, value);
        key == "progress"
    }

    /// Whole percent of `expected_secs` encoded so far.
    pub fn percent(&self, expected_secs: f64) -> u8 {
        if self.complete {
            return 100;
        }
        if expected_secs <= 0.0 {
            return 0;
        }
        ((self.out_time_secs / expected_secs).clamp(0.0, 1.0) * 100.0).floor() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_end_with_progress_key() {
        let mut s = ProgressState::default();
        let out = "frame=10\nout_time_us=2500000\nspeed=1.0x\nprogress=continue\n";
        let closes: Vec<bool> = out.lines().map(|l| s.feed_line(l)).collect();
        assert_eq!(closes, [false, false, false, true]);
        assert!((s.out_time_secs - 2.5).abs() < 1e-9);
        assert_eq!(s.percent(10.0), 25);
        assert!(!s.complete);
    }

    #[test]
    fn end_marker_reports_full_progress() {
        let mut s = ProgressState::default();
        s.feed_line("out_time_ms=1000000");
        s.feed_line("progress=end");
        assert!(s.complete);
        assert_eq!(s.percent(10.0), 100);
    }

    #[test]
    fn garbage_and_unknown_durations_are_tolerated() {
        let mut s = ProgressState::default();
        assert!(!s.feed_line("not a kv line"));
        s.feed_line("out_time_us=N/A");
        assert_eq!(s.out_time_secs, 0.0);
        s.feed_line("out_time_us=99000000");
        assert_eq!(s.percent(0.0), 0);
        assert_eq!(s.percent(10.0), 100);
    }
}
