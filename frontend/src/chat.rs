//! 健康助手对话
//!
//! 仪表盘浮窗与 `/chat` 页面共用同一实现。

use crate::api::MediSightApi;
use crate::error::ApiError;
use crate::request::HttpClient;
use medisight_shared::ChatMessage;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const GREETING: &str = "Hello! I'm your AI health assistant. How can I help you today?";
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again later.";

#[async_trait::async_trait(?Send)]
pub trait ChatBackend {
    async fn reply(&self, message: &str, history: &[ChatMessage]) -> Result<String, ApiError>;
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient> ChatBackend for MediSightApi<C> {
    async fn reply(&self, message: &str, history: &[ChatMessage]) -> Result<String, ApiError> {
        self.chat(message, history).await
    }
}

#[async_trait::async_trait(?Send)]
impl<T: ChatBackend + ?Sized> ChatBackend for Rc<T> {
    async fn reply(&self, message: &str, history: &[ChatMessage]) -> Result<String, ApiError> {
        (**self).reply(message, history).await
    }
}

type Watcher = Rc<dyn Fn(&[ChatMessage], bool)>;

struct Inner<B> {
    backend: B,
    messages: RefCell<Vec<ChatMessage>>,
    pending: Cell<usize>,
    watchers: RefCell<Vec<Watcher>>,
}

/// 一段对话：消息列表从问候语开始，只增不减
pub struct ChatSession<B> {
    inner: Rc<Inner<B>>,
}

impl<B> Clone for ChatSession<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            inner: Rc::new(Inner {
                backend,
                messages: RefCell::new(vec![ChatMessage::assistant(GREETING)]),
                pending: Cell::new(0),
                watchers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.messages.borrow().clone()
    }

    /// 是否有回复尚未返回
    pub fn is_waiting(&self) -> bool {
        self.inner.pending.get() > 0
    }

    /// 注册观察者，立即以当前消息调用一次
    pub fn watch(&self, watcher: impl Fn(&[ChatMessage], bool) + 'static) {
        let watcher: Watcher = Rc::new(watcher);
        self.inner.watchers.borrow_mut().push(watcher.clone());
        watcher(&self.messages(), self.is_waiting());
    }

    fn notify(&self) {
        let snapshot = self.messages();
        let waiting = self.is_waiting();
        let watchers: Vec<Watcher> = self.inner.watchers.borrow().clone();
        for watcher in watchers {
            watcher(&snapshot, waiting);
        }
    }

    fn push(&self, message: ChatMessage) {
        self.inner.messages.borrow_mut().push(message);
        self.notify();
    }

    /// 发送一条消息；空白输入被忽略并返回 false
    pub async fn send(&self, input: &str) -> bool {
        let text = input.trim();
        if text.is_empty() {
            return false;
        }

        let history = self.messages();
        self.inner.pending.set(self.inner.pending.get() + 1);
        self.push(ChatMessage::user(text));

        let result = self.inner.backend.reply(text, &history).await;
        self.inner.pending.set(self.inner.pending.get().saturating_sub(1));

        match result {
            Ok(reply) => self.push(ChatMessage::assistant(reply)),
            Err(err) => {
                log::error!("[Chat] {}", err);
                self.push(ChatMessage::assistant(ERROR_REPLY));
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use medisight_shared::ChatRole;

    #[derive(Default)]
    struct ScriptedBackend {
        replies: RefCell<Vec<Result<String, ApiError>>>,
        seen: RefCell<Vec<(String, usize)>>,
    }

    impl ScriptedBackend {
        fn with(replies: Vec<Result<String, ApiError>>) -> Rc<Self> {
            Rc::new(Self {
                replies: RefCell::new(replies),
                seen: RefCell::default(),
            })
        }
    }

    #[async_trait::async_trait(?Send)]
    impl ChatBackend for ScriptedBackend {
        async fn reply(
            &self,
            message: &str,
            history: &[ChatMessage],
        ) -> Result<String, ApiError> {
            self.seen
                .borrow_mut()
                .push((message.to_string(), history.len()));
            self.replies.borrow_mut().remove(0)
        }
    }

    #[test]
    fn starts_with_greeting() {
        let chat = ChatSession::new(ScriptedBackend::with(vec![]));
        let messages = chat.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, ChatRole::Assistant);
        assert_eq!(messages[0].text, GREETING);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let backend = ScriptedBackend::with(vec![]);
        let chat = ChatSession::new(backend.clone());
        assert!(!chat.send("   ").await);
        assert_eq!(chat.messages().len(), 1);
        assert!(backend.seen.borrow().is_empty());
    }

    #[tokio::test]
    async fn reply_is_appended_and_history_forwarded() {
        let backend = ScriptedBackend::with(vec![
            Ok("Drink water.".to_string()),
            Ok("Rest well.".to_string()),
        ]);
        let chat = ChatSession::new(backend.clone());

        assert!(chat.send(" I have a headache ").await);
        assert!(chat.send("Anything else?").await);

        let texts: Vec<String> = chat.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(
            texts,
            vec![
                GREETING,
                "I have a headache",
                "Drink water.",
                "Anything else?",
                "Rest well."
            ]
        );
        assert_eq!(
            *backend.seen.borrow(),
            vec![
                ("I have a headache".to_string(), 1),
                ("Anything else?".to_string(), 3)
            ]
        );
        assert!(!chat.is_waiting());
    }

    #[tokio::test]
    async fn failure_appends_apology() {
        let backend = ScriptedBackend::with(vec![Err(ApiError::Network {
            operation: "chat",
            source: HttpError::Network("offline".to_string()),
        })]);
        let chat = ChatSession::new(backend);

        chat.send("hello").await;
        let last = chat.messages().pop().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.text, ERROR_REPLY);
    }

    #[tokio::test]
    async fn watchers_see_waiting_state() {
        let backend = ScriptedBackend::with(vec![Ok("ok".to_string())]);
        let chat = ChatSession::new(backend);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        chat.watch(move |messages, waiting| sink.borrow_mut().push((messages.len(), waiting)));

        chat.send("hi").await;
        assert_eq!(*log.borrow(), vec![(1, false), (2, true), (3, false)]);
    }
}
