// Instruments - named slots mapping to drum samples

/// An instrument: a named sample slot with gain and pan.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub id: i32,
    pub name: String,
    /// Output scale, 0.0 and up
    pub gain: f32,
    /// -1.0 (left) to +1.0 (right)
    pub pan: f32,
    /// Path to the sample file; empty means "not assigned yet"
    pub sample_path: String,
}

impl Instrument {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            gain: 1.0,
            pan: 0.0,
            sample_path: String::new(),
        }
    }

    pub fn with_sample(id: i32, name: impl Into<String>, sample_path: impl Into<String>) -> Self {
        let mut instrument = Self::new(id, name);
        instrument.sample_path = sample_path.into();
        instrument
    }
}

/// The project's instruments, kept in ascending id order so iteration
/// is deterministic. Adding an existing id replaces the prior entry.
#[derive(Debug, Clone, Default)]
pub struct InstrumentRack {
    instruments: Vec<Instrument>,
}

impl InstrumentRack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instrument(&mut self, instrument: Instrument) {
        self.remove_instrument(instrument.id);
        self.instruments.push(instrument);
        self.instruments.sort_by_key(|i| i.id);
    }

    pub fn remove_instrument(&mut self, id: i32) {
        self.instruments.retain(|i| i.id != id);
    }

    pub fn get(&self, id: i32) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: i32) -> Option<&mut Instrument> {
        self.instruments.iter_mut().find(|i| i.id == id)
    }

    pub fn has_instrument(&self, id: i32) -> bool {
        self.get(id).is_some()
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn clear(&mut self) {
        self.instruments.clear();
    }

    /// Next unused id (max + 1, starting at 1).
    pub fn next_id(&self) -> i32 {
        self.instruments
            .iter()
            .map(|i| i.id)
            .max()
            .map(|max| max + 1)
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rack_keeps_ascending_id_order() {
        let mut rack = InstrumentRack::new();
        rack.add_instrument(Instrument::new(3, "Hi-Hat"));
        rack.add_instrument(Instrument::new(1, "Kick"));
        rack.add_instrument(Instrument::new(2, "Snare"));

        let ids: Vec<i32> = rack.instruments().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_add_replaces_existing_id() {
        let mut rack = InstrumentRack::new();
        rack.add_instrument(Instrument::new(1, "Kick"));
        rack.add_instrument(Instrument::with_sample(1, "Kick 2", "kick2.wav"));

        assert_eq!(rack.instruments().len(), 1);
        assert_eq!(rack.get(1).unwrap().name, "Kick 2");
        assert_eq!(rack.get(1).unwrap().sample_path, "kick2.wav");
    }

    #[test]
    fn test_lookup_and_removal() {
        let mut rack = InstrumentRack::new();
        rack.add_instrument(Instrument::new(1, "Kick"));

        assert!(rack.has_instrument(1));
        assert!(!rack.has_instrument(2));

        rack.get_mut(1).unwrap().gain = 0.5;
        assert_eq!(rack.get(1).unwrap().gain, 0.5);

        rack.remove_instrument(1);
        assert!(rack.instruments().is_empty());
    }

    #[test]
    fn test_next_id() {
        let mut rack = InstrumentRack::new();
        assert_eq!(rack.next_id(), 1);

        rack.add_instrument(Instrument::new(5, "Tom"));
        assert_eq!(rack.next_id(), 6);
    }
}
