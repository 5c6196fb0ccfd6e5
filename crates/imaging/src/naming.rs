use std::path::{Path, PathBuf};

use crate::filters::KernelSize;

/// `<stem>_<suffix>.bmp`，stem 为去掉最后一个扩展名的文件名
pub fn output_file_name(input: &Path, suffix: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}_{suffix}.bmp")
}

pub fn output_path(output_dir: &Path, input: &Path, suffix: &str) -> PathBuf {
    output_dir.join(output_file_name(input, suffix))
}

/// 模糊输出的后缀带上核大小
pub fn blur_suffix(kernel: KernelSize) -> String {
    format!("blur_{kernel}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names() {
        assert_eq!(
            output_file_name(Path::new("images/cat.bmp"), "grayscale"),
            "cat_grayscale.bmp"
        );
        assert_eq!(
            output_file_name(Path::new("images/a.b.bmp"), "mirrorh"),
            "a.b_mirrorh.bmp"
        );
        assert_eq!(output_file_name(Path::new("dog"), "mirrorv"), "dog_mirrorv.bmp");
    }

    #[test]
    fn test_blur_output_path() {
        let kernel = KernelSize::new(111).unwrap();
        let path = output_path(Path::new("results"), Path::new("images/x.bmp"), &blur_suffix(kernel));
        assert_eq!(path, Path::new("results/x_blur_111.bmp"));
    }
}
