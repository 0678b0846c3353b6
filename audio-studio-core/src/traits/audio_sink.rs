/// Audible output (speakers) for sources whose policy allows it.
pub trait AudioSink: Send + Sync {
    /// Queue an interleaved block for playback.
    fn write(&self, samples: &[f32], sample_rate: u32, channels: u16);
}
