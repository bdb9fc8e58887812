//! 认证服务抽象
//!
//! `AuthProvider` 描述外部认证服务的能力：凭据创建与校验、登出、
//! 显示名更新、按需获取 ID token，以及身份变化通知。
//! 生产实现为 `firebase::FirebaseAuth`，测试使用 `MockAuthProvider`。

use crate::error::ProviderError;
use medisight_shared::Timestamp;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub mod firebase;

/// 认证服务视角下的用户
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: Option<Timestamp>,
}

/// 身份变化监听器：`None` 表示已登出
pub type IdentityListener = Rc<dyn Fn(Option<ProviderUser>)>;

// =========================================================
// 监听器注册表
// =========================================================

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RefCell<Vec<(u64, IdentityListener)>>,
    next_id: Cell<u64>,
}

impl ListenerRegistry {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn add(self: &Rc<Self>, listener: IdentityListener) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        Subscription {
            registry: Rc::downgrade(self),
            id,
        }
    }

    /// 通知所有监听器；回调期间不持有借用
    pub fn emit(&self, user: Option<ProviderUser>) {
        let listeners: Vec<IdentityListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(user.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn remove(&self, id: u64) {
        self.listeners.borrow_mut().retain(|(i, _)| *i != id);
    }
}

/// 订阅句柄，drop 时自动取消订阅
pub struct Subscription {
    registry: Weak<ListenerRegistry>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

// =========================================================
// 认证服务 trait
// =========================================================

#[async_trait::async_trait(?Send)]
pub trait AuthProvider {
    /// 订阅身份变化
    fn subscribe(&self, listener: IdentityListener) -> Subscription;

    /// 恢复持久化的会话；无论成功与否都会发出第一次身份通知
    async fn restore(&self);

    async fn create_user(&self, email: &str, password: &str)
    -> Result<ProviderUser, ProviderError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    async fn update_display_name(&self, name: &str) -> Result<ProviderUser, ProviderError>;

    /// 当前用户的 ID token（按需刷新）；未登录时为 `None`
    async fn id_token(&self) -> Option<String>;
}

#[async_trait::async_trait(?Send)]
impl<T: AuthProvider + ?Sized> AuthProvider for Rc<T> {
    fn subscribe(&self, listener: IdentityListener) -> Subscription {
        (**self).subscribe(listener)
    }

    async fn restore(&self) {
        (**self).restore().await
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, ProviderError> {
        (**self).create_user(email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        (**self).sign_in(email, password).await
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        (**self).sign_out().await
    }

    async fn update_display_name(&self, name: &str) -> Result<ProviderUser, ProviderError> {
        (**self).update_display_name(name).await
    }

    async fn id_token(&self) -> Option<String> {
        (**self).id_token().await
    }
}

// =========================================================
// 测试工具: MockAuthProvider
// =========================================================

#[cfg(test)]
pub struct MockAuthProvider {
    registry: Rc<ListenerRegistry>,
    accounts: RefCell<Vec<(String, String, ProviderUser)>>,
    current: RefCell<Option<ProviderUser>>,
    /// restore 时恢复的用户
    persisted: RefCell<Option<ProviderUser>>,
    /// 下一次调用返回的错误
    fail_next: RefCell<Option<ProviderError>>,
    pub calls: RefCell<Vec<String>>,
}

#[cfg(test)]
impl MockAuthProvider {
    pub fn new() -> Self {
        Self {
            registry: ListenerRegistry::new(),
            accounts: RefCell::new(Vec::new()),
            current: RefCell::new(None),
            persisted: RefCell::new(None),
            fail_next: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn user(uid: &str, email: &str) -> ProviderUser {
        ProviderUser {
            uid: uid.to_string(),
            email: email.to_string(),
            display_name: None,
            created_at: Some(Timestamp::new(1_705_312_200_000)),
        }
    }

    pub fn with_account(self, email: &str, password: &str, uid: &str) -> Self {
        self.accounts.borrow_mut().push((
            email.to_string(),
            password.to_string(),
            Self::user(uid, email),
        ));
        self
    }

    pub fn with_persisted(self, user: ProviderUser) -> Self {
        *self.persisted.borrow_mut() = Some(user);
        self
    }

    pub fn fail_next(&self, code: &str, message: &str) {
        *self.fail_next.borrow_mut() = Some(ProviderError::new(code, message));
    }

    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// 模拟服务端会话失效
    pub fn expire_session(&self) {
        *self.current.borrow_mut() = None;
        self.registry.emit(None);
    }

    fn take_failure(&self) -> Result<(), ProviderError> {
        match self.fail_next.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn set_current(&self, user: Option<ProviderUser>) {
        *self.current.borrow_mut() = user.clone();
        self.registry.emit(user);
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl AuthProvider for MockAuthProvider {
    fn subscribe(&self, listener: IdentityListener) -> Subscription {
        self.registry.add(listener)
    }

    async fn restore(&self) {
        self.calls.borrow_mut().push("restore".into());
        let user = self.persisted.borrow().clone();
        self.set_current(user);
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, ProviderError> {
        self.calls.borrow_mut().push(format!("create_user:{email}"));
        self.take_failure()?;
        if self.accounts.borrow().iter().any(|(e, _, _)| e == email) {
            return Err(ProviderError::new("auth/email-already-in-use", "exists"));
        }
        let uid = format!("uid-{}", self.accounts.borrow().len() + 1);
        let user = Self::user(&uid, email);
        self.accounts
            .borrow_mut()
            .push((email.to_string(), password.to_string(), user.clone()));
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        self.calls.borrow_mut().push(format!("sign_in:{email}"));
        self.take_failure()?;
        let found = self
            .accounts
            .borrow()
            .iter()
            .find(|(e, _, _)| e == email)
            .cloned();
        match found {
            Some((_, p, user)) if p == password => {
                self.set_current(Some(user.clone()));
                Ok(user)
            }
            Some(_) => Err(ProviderError::new("auth/wrong-password", "bad password")),
            None => Err(ProviderError::new("auth/user-not-found", "no user")),
        }
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.calls.borrow_mut().push("sign_out".into());
        self.take_failure()?;
        self.set_current(None);
        Ok(())
    }

    async fn update_display_name(&self, name: &str) -> Result<ProviderUser, ProviderError> {
        self.calls.borrow_mut().push(format!("update_display_name:{name}"));
        self.take_failure()?;
        let mut user = self
            .current
            .borrow()
            .clone()
            .ok_or_else(|| ProviderError::new("auth/user-token-expired", "signed out"))?;
        user.display_name = Some(name.to_string());
        for (_, _, account) in self.accounts.borrow_mut().iter_mut() {
            if account.uid == user.uid {
                *account = user.clone();
            }
        }
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn id_token(&self) -> Option<String> {
        self.current
            .borrow()
            .as_ref()
            .map(|u| format!("token-{}", u.uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_drop_unsubscribes() {
        let registry = ListenerRegistry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        let sub = registry.add(Rc::new(move |u: Option<ProviderUser>| {
            sink.borrow_mut().push(u.map(|u| u.uid));
        }));

        registry.emit(Some(MockAuthProvider::user("u1", "a@b.co")));
        assert_eq!(registry.len(), 1);

        drop(sub);
        registry.emit(None);
        assert_eq!(registry.len(), 0);
        assert_eq!(*seen.borrow(), vec![Some("u1".to_string())]);
    }

    #[test]
    fn listener_may_subscribe_during_emit() {
        let registry = ListenerRegistry::new();
        let nested = Rc::new(RefCell::new(None));

        let reg = registry.clone();
        let slot = nested.clone();
        let _sub = registry.add(Rc::new(move |_: Option<ProviderUser>| {
            if slot.borrow().is_none() {
                *slot.borrow_mut() = Some(reg.add(Rc::new(|_: Option<ProviderUser>| {})));
            }
        }));

        registry.emit(None);
        assert_eq!(registry.len(), 2);
    }
}
