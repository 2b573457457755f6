const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const ACCIDENTALS: [bool; 12] = [
    false, true, false, true, false, false, true, false, true, false, true, false,
];

// One display color per pitch class, walking the hue wheel C..B.
pub const LANE_COLOR_PALETTE: [[f32; 4]; 12] = [
    [1.0, 93.0 / 255.0, 71.0 / 255.0, 1.0],            // C  #FF5D47
    [1.0, 87.0 / 255.0, 126.0 / 255.0, 1.0],           // C# #FF577E
    [1.0, 71.0 / 255.0, 179.0 / 255.0, 1.0],           // D  #FF47B3
    [221.0 / 255.0, 87.0 / 255.0, 1.0, 1.0],           // D# #DD57FF
    [136.0 / 255.0, 133.0 / 255.0, 1.0, 1.0],          // E  #8885FF
    [61.0 / 255.0, 148.0 / 255.0, 1.0, 1.0],           // F  #3D94FF
    [0.0, 184.0 / 255.0, 204.0 / 255.0, 1.0],          // F# #00B8CC
    [92.0 / 255.0, 224.0 / 255.0, 135.0 / 255.0, 1.0], // G  #5CE087
    [174.0 / 255.0, 250.0 / 255.0, 68.0 / 255.0, 1.0], // G# #AEFA44
    [1.0, 1.0, 0.0, 1.0],                              // A  #FFFF00
    [1.0, 190.0 / 255.0, 0.0, 1.0],                    // A# #FFBE00
    [1.0, 125.0 / 255.0, 0.0, 1.0],                    // B  #FF7D00
];

/// One playable pitch channel. Immutable once derived from the octave range.
#[derive(Clone, Debug, PartialEq)]
pub struct Lane {
    pub lane_index: usize,
    pub pitch: u8,
    pub display_name: String,
    pub is_accidental: bool,
    pub color: [f32; 4],
}

/// Derives the lane list for an inclusive octave range, clipped to the MIDI
/// pitch domain 0-127 and ordered pitch-ascending. Identical input always
/// yields an identical list; an empty or fully-clipped range yields an empty
/// one.
pub fn build_lanes(start_octave: i32, end_octave: i32) -> Vec<Lane> {
    let mut lanes = Vec::new();

    for octave in start_octave..=end_octave {
        for pitch_class in 0..12 {
            // Scientific pitch notation: C4 = MIDI 60, so MIDI = (octave+1)*12 + class.
            let pitch = (octave + 1) * 12 + pitch_class;
            if !(0..=127).contains(&pitch) {
                continue;
            }
            let pc = pitch_class as usize;
            lanes.push(Lane {
                lane_index: lanes.len(),
                pitch: pitch as u8,
                display_name: format!("{}{}", NOTE_NAMES[pc], octave),
                is_accidental: ACCIDENTALS[pc],
                color: LANE_COLOR_PALETTE[pc],
            });
        }
    }

    lanes
}

/// Lane lookup by pitch. Lanes are pitch-ascending, so a binary search works.
#[inline(always)]
pub fn lane_for_pitch(lanes: &[Lane], pitch: u8) -> Option<usize> {
    lanes.binary_search_by_key(&pitch, |lane| lane.pitch).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_octave_yields_twelve_ascending_lanes() {
        let lanes = build_lanes(4, 4);
        assert_eq!(lanes.len(), 12);
        assert_eq!(lanes[0].pitch, 60);
        assert_eq!(lanes[0].display_name, "C4");
        assert_eq!(lanes[11].pitch, 71);
        assert_eq!(lanes[11].display_name, "B4");
        for pair in lanes.windows(2) {
            assert!(pair[0].pitch < pair[1].pitch);
        }
        for (i, lane) in lanes.iter().enumerate() {
            assert_eq!(lane.lane_index, i);
        }
    }

    #[test]
    fn range_is_clipped_to_midi_domain() {
        // Octave 9 holds C9..G9 (120..127); G#9 and above do not exist.
        let lanes = build_lanes(9, 10);
        assert_eq!(lanes.len(), 8);
        assert_eq!(lanes.last().map(|l| l.pitch), Some(127));

        let below = build_lanes(-3, -2);
        assert!(below.is_empty());
    }

    #[test]
    fn inverted_range_yields_no_lanes() {
        assert!(build_lanes(5, 4).is_empty());
    }

    #[test]
    fn derivation_is_deterministic() {
        assert_eq!(build_lanes(3, 6), build_lanes(3, 6));
    }

    #[test]
    fn accidentals_are_the_five_sharps() {
        let lanes = build_lanes(4, 4);
        let sharps: Vec<&str> = lanes
            .iter()
            .filter(|l| l.is_accidental)
            .map(|l| l.display_name.as_str())
            .collect();
        assert_eq!(sharps, ["C#4", "D#4", "F#4", "G#4", "A#4"]);
    }

    #[test]
    fn pitch_lookup_finds_only_in_range_pitches() {
        let lanes = build_lanes(4, 5);
        assert_eq!(lane_for_pitch(&lanes, 60), Some(0));
        assert_eq!(lane_for_pitch(&lanes, 83), Some(23));
        assert_eq!(lane_for_pitch(&lanes, 59), None);
        assert_eq!(lane_for_pitch(&lanes, 84), None);
    }
}
