//! Static catalog data: activity icons, model descriptions, sample activities.

/// Icon shown for activities the catalog does not know.
pub const DEFAULT_ACTIVITY_ICON: &str = "fa-user";

const ACTIVITY_ICONS: &[(&str, &str)] = &[
    ("Running", "fa-running"),
    ("Walking", "fa-walking"),
    ("Jumping", "fa-child"),
    ("Standing", "fa-user"),
    ("Sitting", "fa-chair"),
    ("Waving", "fa-hand-paper"),
    ("Squatting", "fa-dumbbell"),
    ("Raising Arms", "fa-hands"),
    ("Bending Over", "fa-arrow-down"),
    ("Unknown Pose", "fa-user-slash"),
];

/// Icon identifier for a recognized activity label.
pub fn activity_icon(activity: &str) -> &'static str {
    ACTIVITY_ICONS
        .iter()
        .find(|(name, _)| *name == activity)
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ACTIVITY_ICON)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub fps: u32,
    pub accuracy: f64,
}

pub const MODELS: &[ModelInfo] = &[ModelInfo {
    key: "yolov8",
    name: "YOLOv8n Pose",
    description: "Activity recognition",
    fps: 15,
    accuracy: 0.85,
}];

const DEFAULT_MODEL_KEY: &str = "yolov8";

/// Model the backend serves by default.
pub fn default_model() -> &'static ModelInfo {
    model(DEFAULT_MODEL_KEY).unwrap_or(&MODELS[0])
}

pub fn model(key: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|model| model.key == key)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleActivity {
    pub name: &'static str,
    pub icon: &'static str,
    pub confidence: f64,
}

/// Example feed contents, listed under `help`.
pub const SAMPLE_ACTIVITIES: &[SampleActivity] = &[
    SampleActivity {
        name: "Running",
        icon: "fa-running",
        confidence: 85.0,
    },
    SampleActivity {
        name: "Walking",
        icon: "fa-walking",
        confidence: 72.0,
    },
    SampleActivity {
        name: "Standing",
        icon: "fa-user",
        confidence: 68.0,
    },
    SampleActivity {
        name: "Sitting",
        icon: "fa-chair",
        confidence: 91.0,
    },
    SampleActivity {
        name: "Jumping",
        icon: "fa-child",
        confidence: 79.0,
    },
];
