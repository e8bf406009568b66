//=========================================================================
// Scenes
//=========================================================================
//
//   Splash ──► Loading ──► Title ◄──► Gameplay
//                           │
//                           └──► exit
//
//=========================================================================

mod gameplay;
mod loading;
mod splash;
mod title;

pub use gameplay::GameplayScene;
pub use loading::{stage_assets, LoadingScene};
pub use splash::SplashScene;
pub use title::TitleScene;
