//! Navigation system
//!
//! This module describes the main stack the navigation host renders:
//! - Route definitions for every screen
//! - Per-screen presentation (card, modal, full-screen modal)
//! - Tab navigation inside the root screen
//! - Navigation stack and state management

use serde::{Deserialize, Serialize};

// =============================================================================
// Route Definitions
// =============================================================================

/// All screens on the main stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "route", content = "params")]
pub enum Route {
    /// Root screen hosting the tab bar
    #[default]
    MainTabs,

    // Stories
    /// Full-screen story playback
    StoryViewer {
        /// Owner of the stories
        user_id: String,
        /// Story to start from
        #[serde(skip_serializing_if = "Option::is_none")]
        start_index: Option<u32>,
    },

    // People
    /// Find friends
    UserSearch,
    /// Another user's profile
    UserProfile {
        /// Profile owner
        user_id: String,
    },

    // Events
    /// Hosts of an event
    HostList {
        /// Event
        event_id: String,
    },
    /// Event management dashboard
    EventManagement,

    // Documents
    /// Upload a document
    DocumentUpload,
    /// Document library
    DocumentList,
    /// Full-screen document viewer
    DocumentViewer {
        /// Document to show
        document_id: String,
    },
}

/// How a screen is presented over the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Presentation {
    /// Pushed card, swipe back enabled
    Card,
    /// Sheet over the current screen
    Modal,
    /// Covers the whole screen, no swipe to dismiss
    FullScreenModal,
}

impl Presentation {
    /// Whether the screen sits in the modal layer rather than the card stack
    pub fn is_modal(&self) -> bool {
        !matches!(self, Presentation::Card)
    }
}

/// Native header configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderOptions {
    /// Title shown in the header bar
    pub title: &'static str,
}

impl Route {
    /// Screen name registered with the navigation host
    pub fn name(&self) -> &'static str {
        match self {
            Route::MainTabs => "MainTabs",
            Route::StoryViewer { .. } => "StoryViewer",
            Route::UserSearch => "UserSearch",
            Route::UserProfile { .. } => "UserProfile",
            Route::HostList { .. } => "HostList",
            Route::EventManagement => "EventManagement",
            Route::DocumentUpload => "DocumentUpload",
            Route::DocumentList => "DocumentList",
            Route::DocumentViewer { .. } => "DocumentViewer",
        }
    }

    /// Presentation style for this screen
    pub fn presentation(&self) -> Presentation {
        match self {
            Route::StoryViewer { .. } | Route::DocumentViewer { .. } => {
                Presentation::FullScreenModal
            }
            Route::MainTabs
            | Route::UserSearch
            | Route::UserProfile { .. }
            | Route::HostList { .. }
            | Route::EventManagement
            | Route::DocumentUpload
            | Route::DocumentList => Presentation::Card,
        }
    }

    /// Whether the back swipe gesture is enabled
    pub fn gesture_enabled(&self) -> bool {
        !matches!(self, Route::StoryViewer { .. } | Route::DocumentViewer { .. })
    }

    /// Header configuration, `None` when the screen draws its own chrome
    pub fn header(&self) -> Option<HeaderOptions> {
        let title = match self {
            Route::UserSearch => "Find Friends",
            Route::UserProfile { .. } => "Profile",
            Route::HostList { .. } => "Event Hosts",
            Route::DocumentUpload => "Upload Document",
            _ => return None,
        };
        Some(HeaderOptions { title })
    }

    /// All screen names in registration order
    pub fn all_names() -> [&'static str; 9] {
        [
            "MainTabs",
            "StoryViewer",
            "UserSearch",
            "UserProfile",
            "HostList",
            "DocumentUpload",
            "DocumentList",
            "DocumentViewer",
            "EventManagement",
        ]
    }
}

// =============================================================================
// Navigation Tabs
// =============================================================================

/// Tabs inside [`Route::MainTabs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NavigationTab {
    /// Home feed of stories
    #[default]
    Home,
    /// Camera and story composer
    Camera,
    /// Conversations
    Chat,
    /// Own profile
    Profile,
}

impl NavigationTab {
    /// Get icon name for this tab
    pub fn icon(&self) -> &'static str {
        match self {
            NavigationTab::Home => "home",
            NavigationTab::Camera => "camera",
            NavigationTab::Chat => "chat",
            NavigationTab::Profile => "user",
        }
    }

    /// Get label for this tab
    pub fn label(&self) -> &'static str {
        match self {
            NavigationTab::Home => "Home",
            NavigationTab::Camera => "Camera",
            NavigationTab::Chat => "Chat",
            NavigationTab::Profile => "Profile",
        }
    }

    /// Get all tabs in order
    pub fn all() -> [NavigationTab; 4] {
        [
            NavigationTab::Home,
            NavigationTab::Camera,
            NavigationTab::Chat,
            NavigationTab::Profile,
        ]
    }
}

// =============================================================================
// Navigation Stack
// =============================================================================

/// A navigation stack entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackEntry {
    /// The route
    pub route: Route,
    /// Unique key for this entry
    pub key: String,
}

impl StackEntry {
    /// Create a new stack entry
    pub fn new(route: Route) -> Self {
        Self {
            route,
            key: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Card stack rooted at [`Route::MainTabs`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStack {
    /// Root entry, never popped
    root: StackEntry,
    /// Entries above the root (bottom to top)
    entries: Vec<StackEntry>,
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new(Route::MainTabs)
    }
}

impl NavigationStack {
    /// Create a new navigation stack with a root route
    pub fn new(root: Route) -> Self {
        Self {
            root: StackEntry::new(root),
            entries: Vec::new(),
        }
    }

    /// Push a route onto the stack
    pub fn push(&mut self, route: Route) {
        self.entries.push(StackEntry::new(route));
    }

    /// Pop the top route (returns true if popped, false if at root)
    pub fn pop(&mut self) -> bool {
        self.entries.pop().is_some()
    }

    /// Pop to root
    pub fn pop_to_root(&mut self) {
        self.entries.clear();
    }

    /// Get the current stack entry
    pub fn current_entry(&self) -> &StackEntry {
        self.entries.last().unwrap_or(&self.root)
    }

    /// Get the current (top) route
    pub fn current(&self) -> &Route {
        &self.current_entry().route
    }

    /// Check if we can go back
    pub fn can_go_back(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Get stack depth including the root
    pub fn depth(&self) -> usize {
        self.entries.len() + 1
    }
}

// =============================================================================
// Navigation State
// =============================================================================

/// Complete navigation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NavigationState {
    /// Active tab inside the root screen
    pub active_tab: NavigationTab,
    /// Card stack
    pub stack: NavigationStack,
    /// Modal stack (overlays on top of the card stack)
    pub modal_stack: Vec<StackEntry>,
}

impl NavigationState {
    /// Create a new navigation state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current route (considering modals)
    pub fn current_route(&self) -> &Route {
        match self.modal_stack.last() {
            Some(modal) => &modal.route,
            None => self.stack.current(),
        }
    }

    /// Open a screen using its configured presentation
    pub fn navigate(&mut self, route: Route) {
        if route == Route::MainTabs {
            self.dismiss_all_modals();
            self.stack.pop_to_root();
            return;
        }
        if route.presentation().is_modal() {
            self.modal_stack.push(StackEntry::new(route));
        } else {
            self.stack.push(route);
        }
    }

    /// Explicit back (header button, close button)
    pub fn go_back(&mut self) -> bool {
        if self.modal_stack.pop().is_some() {
            return true;
        }
        self.stack.pop()
    }

    /// Back swipe; ignored on screens with gestures disabled
    pub fn swipe_back(&mut self) -> bool {
        if !self.current_route().gesture_enabled() {
            return false;
        }
        self.go_back()
    }

    /// Switch to a tab, returning to the root screen
    pub fn switch_tab(&mut self, tab: NavigationTab) {
        self.dismiss_all_modals();
        self.stack.pop_to_root();
        self.active_tab = tab;
    }

    /// Dismiss all modals
    pub fn dismiss_all_modals(&mut self) {
        self.modal_stack.clear();
    }

    /// Check if any modals are presented
    pub fn has_modals(&self) -> bool {
        !self.modal_stack.is_empty()
    }

    /// Check if we can go back
    pub fn can_go_back(&self) -> bool {
        self.has_modals() || self.stack.can_go_back()
    }

    /// Reset entire navigation state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
