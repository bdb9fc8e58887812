//! 图像选择与预览
//!
//! 在把文件交给页面之前校验大小与类型；通过校验后生成 data URL 预览，
//! 并恰好调用一次选择回调。

use crate::error::UploadError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const ACCEPT_IMAGES: &str = "image/*";

/// 一个待上传的本地文件
#[async_trait::async_trait(?Send)]
pub trait ImageSource {
    fn name(&self) -> String;
    /// 字节数
    fn size(&self) -> u64;
    fn mime_type(&self) -> String;
    async fn data_url(&self) -> Result<String, UploadError>;
    async fn bytes(&self) -> Result<Vec<u8>, UploadError>;
}

pub fn max_bytes(max_size_mb: u32) -> u64 {
    u64::from(max_size_mb) * 1024 * 1024
}

pub fn validate_image(size: u64, mime_type: &str, max_size_mb: u32) -> Result<(), UploadError> {
    if size > max_bytes(max_size_mb) {
        return Err(UploadError::TooLarge {
            max_mb: max_size_mb,
        });
    }
    if !mime_type.starts_with("image/") {
        return Err(UploadError::NotAnImage);
    }
    Ok(())
}

/// 一次有效选择的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 已生成预览并回调
    Accepted,
    /// 预览读取期间被清除或被更新的选择取代，未回调
    Superseded,
}

pub struct UploadWidget<F> {
    max_size_mb: u32,
    preview: RefCell<Option<String>>,
    /// 文件输入框的代号，递增后重新渲染输入框以允许重复选择同一文件
    input_generation: Cell<u32>,
    /// 每次有效选择递增，迟到的预览不会覆盖较新的选择
    selection: Cell<u64>,
    on_select: Rc<dyn Fn(F)>,
}

impl<F: ImageSource> UploadWidget<F> {
    pub fn new(max_size_mb: u32, on_select: impl Fn(F) + 'static) -> Self {
        Self {
            max_size_mb,
            preview: RefCell::new(None),
            input_generation: Cell::new(0),
            selection: Cell::new(0),
            on_select: Rc::new(on_select),
        }
    }

    pub fn max_size_mb(&self) -> u32 {
        self.max_size_mb
    }

    pub fn preview(&self) -> Option<String> {
        self.preview.borrow().clone()
    }

    pub fn input_generation(&self) -> u32 {
        self.input_generation.get()
    }

    /// 校验并接收文件；被拒绝时不生成预览也不回调
    pub async fn select_image(&self, file: F) -> Result<Selection, UploadError> {
        validate_image(file.size(), &file.mime_type(), self.max_size_mb)?;

        let selection = self.selection.get() + 1;
        self.selection.set(selection);

        let preview = match file.data_url().await {
            Ok(url) => Some(url),
            Err(err) => {
                log::warn!("[Upload] Preview of {} failed: {}", file.name(), err);
                None
            }
        };

        if self.selection.get() != selection {
            return Ok(Selection::Superseded);
        }
        *self.preview.borrow_mut() = preview;
        (self.on_select)(file);
        Ok(Selection::Accepted)
    }

    pub fn clear(&self) {
        *self.preview.borrow_mut() = None;
        self.selection.set(self.selection.get() + 1);
        self.input_generation.set(self.input_generation.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct FakeFile {
        name: &'static str,
        size: u64,
        mime: &'static str,
    }

    #[async_trait::async_trait(?Send)]
    impl ImageSource for FakeFile {
        fn name(&self) -> String {
            self.name.to_string()
        }
        fn size(&self) -> u64 {
            self.size
        }
        fn mime_type(&self) -> String {
            self.mime.to_string()
        }
        async fn data_url(&self) -> Result<String, UploadError> {
            Ok(format!("data:{};base64,AAAA", self.mime))
        }
        async fn bytes(&self) -> Result<Vec<u8>, UploadError> {
            Ok(vec![0; self.size as usize])
        }
    }

    fn widget(max_mb: u32) -> (UploadWidget<FakeFile>, Rc<RefCell<Vec<String>>>) {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        let widget = UploadWidget::new(max_mb, move |f: FakeFile| sink.borrow_mut().push(f.name.to_string()));
        (widget, received)
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert_eq!(validate_image(5 * 1024 * 1024, "image/png", 5), Ok(()));
        assert_eq!(
            validate_image(5 * 1024 * 1024 + 1, "image/png", 5),
            Err(UploadError::TooLarge { max_mb: 5 })
        );
    }

    #[test]
    fn mime_must_be_image() {
        assert_eq!(
            validate_image(10, "application/pdf", 5),
            Err(UploadError::NotAnImage)
        );
        assert_eq!(validate_image(10, "", 5), Err(UploadError::NotAnImage));
        assert_eq!(validate_image(10, "image/jpeg", 5), Ok(()));
    }

    /// 读取预览时先让出一次执行权
    struct SlowFile(FakeFile);

    #[async_trait::async_trait(?Send)]
    impl ImageSource for SlowFile {
        fn name(&self) -> String {
            self.0.name()
        }
        fn size(&self) -> u64 {
            self.0.size()
        }
        fn mime_type(&self) -> String {
            self.0.mime_type()
        }
        async fn data_url(&self) -> Result<String, UploadError> {
            tokio::task::yield_now().await;
            self.0.data_url().await
        }
        async fn bytes(&self) -> Result<Vec<u8>, UploadError> {
            self.0.bytes().await
        }
    }

    #[tokio::test]
    async fn accepted_file_produces_preview_and_one_callback() {
        let (widget, received) = widget(5);
        let file = FakeFile {
            name: "mole.png",
            size: 3 * 1024 * 1024,
            mime: "image/png",
        };

        let outcome = widget.select_image(file).await.unwrap();
        assert_eq!(outcome, Selection::Accepted);
        assert_eq!(*received.borrow(), vec!["mole.png".to_string()]);
        assert_eq!(
            widget.preview().as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[tokio::test]
    async fn clear_during_preview_supersedes_selection() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        let widget = UploadWidget::new(5, move |f: SlowFile| sink.borrow_mut().push(f.name()));
        let file = SlowFile(FakeFile {
            name: "eye.png",
            size: 100,
            mime: "image/png",
        });

        let (outcome, ()) = futures::join!(widget.select_image(file), async { widget.clear() });

        assert_eq!(outcome.unwrap(), Selection::Superseded);
        assert!(received.borrow().is_empty());
        assert!(widget.preview().is_none());
    }

    #[tokio::test]
    async fn rejected_file_produces_nothing() {
        let (widget, received) = widget(5);
        let big = FakeFile {
            name: "huge.png",
            size: 6 * 1024 * 1024,
            mime: "image/png",
        };
        let pdf = FakeFile {
            name: "report.pdf",
            size: 10,
            mime: "application/pdf",
        };

        let err = widget.select_image(big).await.unwrap_err();
        assert_eq!(err.to_string(), "File size must be less than 5MB");
        let err = widget.select_image(pdf).await.unwrap_err();
        assert_eq!(err.to_string(), "Please select a valid image file");

        assert!(received.borrow().is_empty());
        assert!(widget.preview().is_none());
    }

    #[tokio::test]
    async fn clear_resets_preview_and_allows_reselect() {
        let (widget, received) = widget(5);
        let file = FakeFile {
            name: "eye.png",
            size: 100,
            mime: "image/png",
        };

        widget.select_image(file.clone()).await.unwrap();
        let generation = widget.input_generation();
        widget.clear();
        assert!(widget.preview().is_none());
        assert_eq!(widget.input_generation(), generation + 1);

        widget.select_image(file).await.unwrap();
        assert_eq!(received.borrow().len(), 2);
        assert!(widget.preview().is_some());
    }
}
