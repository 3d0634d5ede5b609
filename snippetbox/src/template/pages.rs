use super::{filters, TemplateData};
use askama::Template;

#[derive(Template)]
#[template(path = "home.page.html")]
struct HomePage<'a> {
    data: &'a TemplateData,
}

#[derive(Template)]
#[template(path = "show.page.html")]
struct ShowPage<'a> {
    data: &'a TemplateData,
}

#[derive(Template)]
#[template(path = "create.page.html")]
struct CreatePage<'a> {
    data: &'a TemplateData,
}

#[derive(Template)]
#[template(path = "signup.page.html")]
struct SignupPage<'a> {
    data: &'a TemplateData,
}

#[derive(Template)]
#[template(path = "login.page.html")]
struct LoginPage<'a> {
    data: &'a TemplateData,
}

pub(super) fn home(data: &TemplateData) -> askama::Result<String> {
    HomePage { data }.render()
}

pub(super) fn show(data: &TemplateData) -> askama::Result<String> {
    ShowPage { data }.render()
}

pub(super) fn create(data: &TemplateData) -> askama::Result<String> {
    CreatePage { data }.render()
}

pub(super) fn signup(data: &TemplateData) -> askama::Result<String> {
    SignupPage { data }.render()
}

pub(super) fn login(data: &TemplateData) -> askama::Result<String> {
    LoginPage { data }.render()
}
