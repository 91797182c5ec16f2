use crate::error::Result;
use crate::message::{
    FieldMapping, Message, MessageCollection, MessageItem, fill_collection, set_string, set_u32,
};

/// One work unit as reported under `units`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unit {
    /// Queue identifier
    pub id: String,
    /// Slot the unit is assigned to
    pub slot: String,
    /// Unit state, e.g. `RUNNING` or `DOWNLOAD`
    pub state: String,
    /// Error code, `NO_ERROR` when healthy
    pub error: String,
    /// Project number
    pub project: u32,
    /// Run number
    pub run: u32,
    /// Clone number
    pub clone: u32,
    /// Generation number
    pub generation: u32,
    /// Science core, e.g. `0xa8`
    pub core: String,
    /// Unit hash
    pub unit: String,
    /// Progress, e.g. `12.50%`
    pub percent_done: String,
    /// Estimated time to completion
    pub eta: String,
    /// Estimated points per day
    pub ppd: String,
    /// Estimated credit on completion
    pub credit_estimate: String,
    /// What the unit is waiting for, if anything
    pub waiting_on: String,
    /// When the next attempt happens
    pub next_attempt: String,
    /// Time remaining before the timeout
    pub time_remaining: String,
    /// Total frames in the unit
    pub total_frames: u32,
    /// Frames completed
    pub frames_done: u32,
    /// Assignment time
    pub assigned: String,
    /// Timeout time
    pub timeout: String,
    /// Deadline time
    pub deadline: String,
    /// Work server address
    pub work_server: String,
    /// Collection server address
    pub collection_server: String,
    /// Download or upload attempts so far
    pub attempts: u32,
    /// Time per frame
    pub tpf: String,
    /// Base credit
    pub base_credit: String,
}

macro_rules! text_field {
    ($name:literal, $field:ident) => {
        FieldMapping {
            name: $name,
            set: |unit: &mut Unit, v| set_string(&mut unit.$field, v),
        }
    };
}

macro_rules! count_field {
    ($name:literal, $field:ident) => {
        FieldMapping {
            name: $name,
            set: |unit: &mut Unit, v| set_u32(&mut unit.$field, v),
        }
    };
}

impl MessageItem for Unit {
    const FIELDS: &'static [FieldMapping<Self>] = &[
        text_field!("id", id),
        text_field!("slot", slot),
        text_field!("state", state),
        text_field!("error", error),
        count_field!("project", project),
        count_field!("run", run),
        count_field!("clone", clone),
        count_field!("gen", generation),
        text_field!("core", core),
        text_field!("unit", unit),
        text_field!("percentdone", percent_done),
        text_field!("eta", eta),
        text_field!("ppd", ppd),
        text_field!("creditestimate", credit_estimate),
        text_field!("waitingon", waiting_on),
        text_field!("nextattempt", next_attempt),
        text_field!("timeremaining", time_remaining),
        count_field!("totalframes", total_frames),
        count_field!("framesdone", frames_done),
        text_field!("assigned", assigned),
        text_field!("timeout", timeout),
        text_field!("deadline", deadline),
        text_field!("ws", work_server),
        text_field!("cs", collection_server),
        count_field!("attempts", attempts),
        text_field!("tpf", tpf),
        text_field!("basecredit", base_credit),
    ];
}

/// The work queue, in the order sent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitCollection {
    /// The units
    pub units: Vec<Unit>,
}

impl UnitCollection {
    /// Units assigned to slot `slot`
    pub fn for_slot<'a>(&'a self, slot: &'a str) -> impl Iterator<Item = &'a Unit> + 'a {
        self.units.iter().filter(move |unit| unit.slot == slot)
    }

    /// Number of units
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Message for UnitCollection {
    fn fill(&mut self, value: &str) -> Result<()> {
        self.units.clear();
        fill_collection::<Self, Unit>(self, value)
    }
}

impl MessageCollection<Unit> for UnitCollection {
    fn push(&mut self, item: Unit) {
        self.units.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: &str = r#"[{"id": "01", "state": "RUNNING", "error": "NO_ERROR",
        "project": 18213, "run": 1, "clone": 70, "gen": 12, "core": "0xa8",
        "unit": "0x0000000c0000004600004725", "percentdone": "47.21%",
        "eta": "3 hours 02 mins", "ppd": "215431", "creditestimate": "53714",
        "waitingon": "", "nextattempt": "0.00 secs", "timeremaining": "2.04 days",
        "totalframes": 100, "framesdone": 47, "assigned": "2020-05-04T09:13:42Z",
        "timeout": "2020-05-05T09:13:42Z", "deadline": "2020-05-07T09:13:42Z",
        "ws": "128.252.203.2", "cs": "0.0.0.0", "attempts": 0, "slot": "00",
        "tpf": "3 mins 27 secs", "basecredit": "9405"}]"#;

    #[test]
    fn test_fill_units() {
        let mut units = UnitCollection::default();
        units.fill(UNITS).unwrap();

        assert_eq!(units.len(), 1);
        let unit = &units.units[0];
        assert_eq!(unit.project, 18213);
        assert_eq!(unit.generation, 12);
        assert_eq!(unit.frames_done, 47);
        assert_eq!(unit.percent_done, "47.21%");
        assert_eq!(unit.work_server, "128.252.203.2");
        assert_eq!(units.for_slot("00").count(), 1);
        assert_eq!(units.for_slot("01").count(), 0);
    }

    #[test]
    fn test_fill_rejects_negative_project() {
        let mut units = UnitCollection::default();
        assert!(units.fill(r#"[{"project": -1}]"#).is_err());
    }
}
