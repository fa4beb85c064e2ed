use super::{FormClearListener, ListenerId, WidgetStateStore};

/// Keeps at most one form-clear subscription for a chart component.
///
/// Re-registering for the same form keeps the existing subscription;
/// registering for another form (or none) disconnects it first.
#[derive(Debug, Default)]
pub struct FormClearHelper {
    connection: Option<(String, ListenerId)>,
}

impl FormClearHelper {
    #[must_use]
    pub fn form_id(&self) -> Option<&str> {
        self.connection.as_ref().map(|(form_id, _)| form_id.as_str())
    }

    /// Ensures a listener is registered for `form_id`.
    ///
    /// `listener` is only built when a new subscription is made. Returns
    /// `true` when a new subscription was registered.
    pub fn manage<S, F>(&mut self, store: &mut S, form_id: Option<&str>, listener: F) -> bool
    where
        S: WidgetStateStore + ?Sized,
        F: FnOnce() -> FormClearListener,
    {
        if form_id.is_some() && self.form_id() == form_id {
            return false;
        }
        self.disconnect(store);

        let Some(form_id) = form_id.filter(|form_id| !form_id.is_empty()) else {
            return false;
        };
        let id = store.add_form_clear_listener(form_id, listener());
        self.connection = Some((form_id.to_owned(), id));
        true
    }

    pub fn disconnect<S>(&mut self, store: &mut S)
    where
        S: WidgetStateStore + ?Sized,
    {
        if let Some((_, id)) = self.connection.take() {
            store.remove_form_clear_listener(id);
        }
    }
}
