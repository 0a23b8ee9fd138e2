/// Configuration for the frontend application

/// Base URL for static assets
pub const BASE_URL: &str = match option_env!("PULSE_BASE_URL") {
    Some(url) => url,
    None => "/",
};

// 翻译接口地址 - 编译时从环境变量读取，默认同源部署
pub const TRANSLATE_API: &str = match option_env!("PULSE_TRANSLATE_API") {
    Some(url) => url,
    None => "/api/translate",
};

/// Helper function to construct asset paths
pub fn asset_path(path: &str) -> String {
    // Remove leading slash if present
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{}{}", BASE_URL, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_paths_are_relative_to_base() {
        assert_eq!(
            asset_path("/assets/data/insights-data.json"),
            format!("{BASE_URL}assets/data/insights-data.json")
        );
        assert_eq!(asset_path("assets/data/archive"), format!("{BASE_URL}assets/data/archive"));
    }
}
