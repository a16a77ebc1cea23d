use std::sync::{Arc, Mutex, MutexGuard};

use crate::SpectrumFrame;

/// Latest-wins handoff cell between the producer thread and the render loop.
///
/// Holds at most one live frame. `publish` overwrites whatever is stored, so
/// a slow consumer never builds up a backlog and a fast producer never
/// blocks. Both sides only ever swap an [`Arc`] under the lock, so the
/// critical section is O(1) regardless of band count and a reader can never
/// observe a mix of two publishes.
#[derive(Debug, Default)]
pub struct ParameterChannel {
    slot: Mutex<Slot>,
}

#[derive(Debug, Default)]
struct Slot {
    frame: Option<Arc<SpectrumFrame>>,
    version: u64,
}

impl ParameterChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `frame` as the new latest value, dropping any predecessor.
    /// Never blocks beyond the O(1) swap and has no failure path.
    pub fn publish(&self, frame: SpectrumFrame) {
        let frame = Arc::new(frame);
        let mut slot = self.lock();
        slot.frame = Some(frame);
        slot.version = slot.version.wrapping_add(1);
    }

    /// Returns the most recently published frame, or `None` before the first
    /// publish. Never blocks beyond the O(1) clone of the handle.
    pub fn read_latest(&self) -> Option<Arc<SpectrumFrame>> {
        self.lock().frame.clone()
    }

    /// Monotone publish counter; consecutive publishes between two reads are
    /// coalesced into the latest frame but still advance this counter.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // A panic while holding the lock only occurs if an Arc swap panics,
        // which it cannot; recover the guard rather than poisoning forever.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::spectrum::NO_ALARM;

    #[test]
    fn empty_before_first_publish() {
        let channel = ParameterChannel::new();
        assert!(channel.read_latest().is_none());
        assert_eq!(channel.version(), 0);
    }

    #[test]
    fn publishes_coalesce_to_the_newest_frame() {
        let channel = ParameterChannel::new();
        for level in 0..10 {
            let bands = vec![level as f32 / 10.0; 4];
            channel.publish(SpectrumFrame::new(NO_ALARM, &bands, 4));
        }
        let latest = channel.read_latest().unwrap();
        assert!((latest.bands()[0] - 0.9).abs() < f32::EPSILON);
        assert_eq!(channel.version(), 10);
    }

    #[test]
    fn concurrent_publishes_never_tear() {
        let channel = Arc::new(ParameterChannel::new());
        let writer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                for i in 0..500u32 {
                    // Every band of one publish carries the same value, so a
                    // torn read would show up as a mixed-value frame.
                    let value = (i % 100) as f32 / 100.0;
                    let bands = vec![value; 64];
                    channel.publish(SpectrumFrame::new(value, &bands, 64));
                }
            })
        };

        for _ in 0..500 {
            if let Some(frame) = channel.read_latest() {
                let first = frame.bands()[0];
                assert!(frame.bands().iter().all(|&b| b == first));
                assert_eq!(frame.alarm(), Some(first));
            }
        }
        writer.join().unwrap();
    }
}
