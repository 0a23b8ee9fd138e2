use super::Labels;

pub const LABELS: Labels = Labels {
    lang_switch: "EN",
    lang_switch_aria: "切换到英文",
    no_archive_data: "暂无归档数据",
};
