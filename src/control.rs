//! Lock-free control path from a UI/MIDI thread to the audio thread.
//!
//! The control side pushes [`ControlMessage`]s into a wait-free SPSC ring;
//! the audio side drains everything pending at the top of each block and
//! then renders. Engine state is only ever touched on the audio thread.

use rtrb::{Consumer, Producer, RingBuffer};

use crate::engine::Synth;
use crate::error::{SynthError, SynthResult};
use crate::params::Parameter;

/// Default queue depth.
pub const CONTROL_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlMessage<P: Parameter> {
    NoteOn { frequency: f64, velocity: f64 },
    NoteOff,
    SetParam(P, f64),
}

/// Control-thread end of the queue.
pub struct ControlProducer<P: Parameter> {
    tx: Producer<ControlMessage<P>>,
}

/// Audio-thread end of the queue.
pub struct ControlConsumer<P: Parameter> {
    rx: Consumer<ControlMessage<P>>,
}

/// Create a connected producer/consumer pair holding up to `capacity`
/// messages.
pub fn control_channel<P: Parameter>(capacity: usize) -> (ControlProducer<P>, ControlConsumer<P>) {
    let (tx, rx) = RingBuffer::new(capacity);
    (ControlProducer { tx }, ControlConsumer { rx })
}

impl<P: Parameter> ControlProducer<P> {
    pub fn send(&mut self, message: ControlMessage<P>) -> SynthResult<()> {
        self.tx.push(message).map_err(|_| SynthError::QueueFull)
    }

    pub fn note_on(&mut self, frequency: f64, velocity: f64) -> SynthResult<()> {
        self.send(ControlMessage::NoteOn { frequency, velocity })
    }

    pub fn note_off(&mut self) -> SynthResult<()> {
        self.send(ControlMessage::NoteOff)
    }

    pub fn set_param(&mut self, param: P, value: f64) -> SynthResult<()> {
        self.send(ControlMessage::SetParam(param, value))
    }

    /// Free slots left in the queue.
    pub fn slots(&self) -> usize {
        self.tx.slots()
    }
}

impl<P: Parameter> ControlConsumer<P> {
    /// Apply every pending message to `synth`, in order. Returns how many
    /// were applied.
    pub fn drain_into<S: Synth<Param = P>>(&mut self, synth: &mut S) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.rx.pop() {
            match message {
                ControlMessage::NoteOn { frequency, velocity } => {
                    synth.note_on_with_velocity(frequency, velocity)
                }
                ControlMessage::NoteOff => synth.note_off(),
                ControlMessage::SetParam(param, value) => synth.set_param(param, value),
            }
            applied += 1;
        }
        applied
    }
}

/// Drain pending control messages, then fill `out`.
pub fn render_block<S: Synth>(consumer: &mut ControlConsumer<S::Param>, synth: &mut S, out: &mut [f32]) {
    consumer.drain_into(synth);
    synth.process_block(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::{DisynEngine, PmEngine};
    use crate::params::{DisynParam, PmParam};

    #[test]
    fn messages_apply_in_order() {
        let (mut tx, mut rx) = control_channel::<DisynParam>(8);
        let mut disyn = DisynEngine::new(EngineConfig::default());

        tx.set_param(DisynParam::MasterGain, 0.2).unwrap();
        tx.set_param(DisynParam::MasterGain, 0.6).unwrap();
        tx.note_on(220.0, 0.5).unwrap();
        assert!(!disyn.is_playing());

        assert_eq!(rx.drain_into(&mut disyn), 3);
        assert_eq!(disyn.param(DisynParam::MasterGain), 0.6);
        assert!(disyn.is_playing());
        assert_eq!(disyn.velocity(), 0.5);
        assert_eq!(rx.drain_into(&mut disyn), 0);
    }

    #[test]
    fn full_queue_reports_error() {
        let (mut tx, _rx) = control_channel::<PmParam>(2);
        tx.note_off().unwrap();
        tx.note_off().unwrap();
        assert_eq!(tx.slots(), 0);
        assert!(matches!(tx.note_off(), Err(SynthError::QueueFull)));
    }

    #[test]
    fn render_block_across_threads() {
        let (mut tx, mut rx) = control_channel::<PmParam>(CONTROL_QUEUE_CAPACITY);
        let control = std::thread::spawn(move || {
            tx.set_param(PmParam::InterfaceType, 0.0).unwrap();
            tx.note_on(196.0, 1.0).unwrap();
        });
        control.join().unwrap();

        let mut pm = PmEngine::new(EngineConfig::default());
        let mut block = [0.0f32; 512];
        render_block(&mut rx, &mut pm, &mut block);
        assert!(pm.is_playing());
        assert_eq!(pm.param(PmParam::InterfaceType), 0.0);
        assert!(block.iter().all(|s| s.is_finite()));
        assert!(block.iter().any(|&s| s != 0.0));
    }
}
