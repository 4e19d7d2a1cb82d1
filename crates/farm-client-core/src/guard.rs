use crate::AuthContext;

/// Decides whether protected content is shown for the current session.
///
/// An action is only checked together with a section. Without a session the
/// fallback is always chosen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGuard {
    required_section: Option<String>,
    required_action: Option<String>,
}

#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Fallback,
}

impl GuardDecision {
    /// Returns `true` if the guard decision is [`Render`].
    ///
    /// [`Render`]: GuardDecision::Render
    #[must_use]
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render)
    }
}

impl RoleGuard {
    /// Only requires a session
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section<S: Into<String>>(section: S) -> Self {
        Self {
            required_section: Some(section.into()),
            required_action: None,
        }
    }

    pub fn action<S: Into<String>>(mut self, action: S) -> Self {
        self.required_action = Some(action.into());
        self
    }

    #[tracing::instrument(ret, skip(context))]
    pub fn decide(&self, context: &AuthContext) -> GuardDecision {
        let Ok(user) = context.current_user() else {
            return GuardDecision::Fallback;
        };
        let Some(section) = self.required_section.as_deref() else {
            return GuardDecision::Render;
        };
        if !user.can_access_section(section) {
            return GuardDecision::Fallback;
        }
        if let Some(action) = self.required_action.as_deref() {
            if !user.has_permission(section, Some(action)) {
                return GuardDecision::Fallback;
            }
        }
        GuardDecision::Render
    }

    pub fn render<T, C, F>(&self, context: &AuthContext, content: C, fallback: F) -> T
    where
        C: FnOnce() -> T,
        F: FnOnce() -> T,
    {
        match self.decide(context) {
            GuardDecision::Render => content(),
            GuardDecision::Fallback => fallback(),
        }
    }

    /// Same as [`Self::render`] with nothing as the fallback
    pub fn render_or_nothing<T, C>(&self, context: &AuthContext, content: C) -> Option<T>
    where
        C: FnOnce() -> T,
    {
        self.render(context, || Some(content()), || None)
    }
}
