use super::Labels;

pub const LABELS: Labels = Labels {
    lang_switch: "中文",
    lang_switch_aria: "Switch to Chinese",
    no_archive_data: "No archive data",
};
